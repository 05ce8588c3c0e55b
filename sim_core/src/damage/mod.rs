//! The damage pipeline: attacker-side amplification, crit, defense,
//! resistance, and independent reductions

mod calculation;
mod packet;
mod resolution;

pub use calculation::{attack_side, compute_packet, CritMode};
pub use packet::DamagePacket;
pub use resolution::{defense_side, preview, resolve_break, DamagePreview, DefenseModifiers};
