//! Deterministic name→port assignment.
//!
//! FNV-1a over the session name, folded into a fixed port range. Both sides
//! compute the same mapping with no coordination; a hash collision between
//! two names is harmless because claiming treats a busy port as "name in
//! use, try the next".

const PORT_RANGE_START: u16 = 25300;
const PORT_RANGE_SPAN: u32 = 200;

/// Session names tried in claiming order.
const SESSION_NAMES: &[&str] = &["jake", "annie", "kevin", "elsa", "rocket", "nova"];

pub fn session_names() -> &'static [&'static str] {
    SESSION_NAMES
}

/// The port a relay answering to `name` listens on.
pub fn port_for(name: &str) -> u16 {
    PORT_RANGE_START + (fnv1a(name) % PORT_RANGE_SPAN) as u16
}

fn fnv1a(input: &str) -> u32 {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in input.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_is_deterministic_across_processes() {
        // Pinned so an old client can always find a new relay.
        assert_eq!(port_for("kevin"), 25302);
        assert_eq!(port_for("jake"), 25460);
    }

    #[test]
    fn every_name_lands_in_range() {
        for name in session_names() {
            let port = port_for(name);
            assert!((25300..25500).contains(&port), "{name} -> {port}");
        }
    }

    #[test]
    fn default_names_do_not_collide() {
        let mut ports: Vec<u16> = session_names().iter().map(|n| port_for(n)).collect();
        ports.sort_unstable();
        ports.dedup();
        assert_eq!(ports.len(), session_names().len());
    }
}
