use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// The master id and the ids derived from it for each linked row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedIds {
    pub master: String,
    pub fabric: String,
    pub tailor: String,
    pub combined: String,
}

impl LinkedIds {
    /// `CMB<unix millis><3-digit random>`
    pub fn generate() -> Self {
        let random: u16 = rand::thread_rng().gen_range(0..1000);
        Self::from_master(&format!("CMB{}{:03}", Utc::now().timestamp_millis(), random))
    }

    pub fn from_master(master: &str) -> Self {
        Self {
            master: master.to_string(),
            fabric: format!("F-{}", master),
            tailor: format!("T-{}", master),
            combined: format!("C-{}", master),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_master_shape() {
        let ids = LinkedIds::generate();
        assert!(ids.master.starts_with("CMB"));
        let digits = &ids.master[3..];
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
        // 13-digit millis plus 3 random digits
        assert_eq!(digits.len(), 16);
    }

    #[test]
    fn test_linked_ids_share_master() {
        let ids = LinkedIds::from_master("CMB1741939200000042");
        assert_eq!(ids.fabric, "F-CMB1741939200000042");
        assert_eq!(ids.tailor, "T-CMB1741939200000042");
        assert_eq!(ids.combined, "C-CMB1741939200000042");
    }
}
