use std::io::Write;
use tempfile::NamedTempFile;
use wmbus_dv::{create_meter, Config, DvError, Quantity, Unit};

#[test]
fn test_load_config_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "meters": [
                {{ "name": "heat", "driver": "sharky775", "id": "68926025", "key": "00112233445566778899AABBCCDDEEFF" }}
            ],
            "units": ["gj", "l", "w"]
        }}"#
    )
    .unwrap();

    let config = Config::load(file.path()).unwrap();
    let info = config.meter("heat").unwrap().clone();
    assert_eq!(info.key.as_deref(), Some("00112233445566778899AABBCCDDEEFF"));

    let units = config.output_units();
    assert_eq!(units.unit_for(Quantity::Energy), Some(Unit::Gj));
    assert_eq!(units.unit_for(Quantity::Power), Some(Unit::W));

    let meter = create_meter(info).unwrap();
    assert_eq!(meter.driver().name, "sharky775");
}

#[test]
fn test_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, DvError::Config(_)));
}

#[test]
fn test_unknown_driver_in_config() {
    let config = Config::from_json(r#"{ "meters": [{ "name": "x", "driver": "nosuch", "id": "1" }] }"#).unwrap();
    let info = config.meters[0].clone();
    assert_eq!(create_meter(info).unwrap_err(), DvError::UnknownDriver("nosuch".to_string()));
}
