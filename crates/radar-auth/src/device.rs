//! Durable device identity
//!
//! A client-generated opaque string persisted in local storage, created
//! once per installation and sent with every auth-sensitive request so
//! the backend can distinguish sessions per device. Never rotated here.

use chrono::Utc;
use radar_storage::Database;
use uuid::Uuid;

use crate::Result;

const DEVICE_ID_KEY: &str = "device_id";

/// Returns the persisted device identity, generating and storing a new
/// one on first use.
pub fn get_or_create_device_id(db: &Database) -> Result<String> {
    if let Some(id) = db.get_setting(DEVICE_ID_KEY)? {
        return Ok(id);
    }

    let id = generate_device_id();
    db.set_setting(DEVICE_ID_KEY, &id)?;

    tracing::info!(device_id = %id, "Generated new device identity");

    Ok(id)
}

fn generate_device_id() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    format!("device-{}-{}", Uuid::new_v4(), to_base36(millis))
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if n == 0 {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    out.into_iter().map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_id_is_stable_per_database() {
        let db = Database::open_in_memory().unwrap();

        let first = get_or_create_device_id(&db).unwrap();
        let second = get_or_create_device_id(&db).unwrap();

        assert_eq!(first, second);
        assert!(first.starts_with("device-"));
    }

    #[test]
    fn test_fresh_database_gets_new_device_id() {
        let a = get_or_create_device_id(&Database::open_in_memory().unwrap()).unwrap();
        let b = get_or_create_device_id(&Database::open_in_memory().unwrap()).unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_700_000_000_000), "loyw3v28");
    }
}
