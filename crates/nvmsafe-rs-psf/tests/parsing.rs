// crates/nvmsafe-rs-psf/tests/parsing.rs

use nvmsafe_rs::{
    DeviceDefinition, DeviceRegistry, ElementDefinition, ElementType, ElementValue, Endianness,
    FileInfo, FileVersion, InterpretedList, ListContent, ListDefinition, ListLocator, ModelError,
    ParamSetFile, PoolDefinition, RawEntry, Scalar, list_checksum,
};
use nvmsafe_rs_psf::{
    PsfError, load_parameter_set_file, load_parameter_set_file_from_str,
    load_parameter_set_file_from_str_unchecked, load_parameter_set_file_unchecked,
    check_list_crcs, save_clean_parameter_set_file, save_parameter_set_file,
    save_parameter_set_file_to_string, validate_against_schema,
};
use std::fs;

fn registry() -> DeviceRegistry {
    let mut registry = DeviceRegistry::new();
    registry.insert(
        3,
        DeviceDefinition::new("Gateway").with_pool(
            PoolDefinition::new("Calibration", Endianness::Big)
                .with_list(
                    ListDefinition::new("Limits", 0x1000)
                        .with_element(ElementDefinition::scalar("speed", ElementType::Unsigned16))
                        .with_element(ElementDefinition::scalar("offset", ElementType::Signed16)),
                )
                .with_list(
                    ListDefinition::new("Gains", 0x2000)
                        .with_element(ElementDefinition::array("gains", ElementType::Real32, 2)),
                ),
        ),
    );
    registry
}

fn info() -> FileInfo {
    FileInfo {
        creation_time: "2024-05-01 10:00:00".into(),
        creator: "tester".into(),
        tool_name: "nvmsafe".into(),
        tool_version: "0.0.0".into(),
        project_name: "bench".into(),
        project_version: "1".into(),
        user_comment: "values & <limits>".into(),
    }
}

fn sample_file(registry: &DeviceRegistry) -> ParamSetFile {
    let limits = ListLocator::new(3, 0, 0);
    let gains = ListLocator::new(3, 0, 1);

    let mut limits_values = InterpretedList::defaults(limits, registry).unwrap();
    limits_values.set_value(limits.element(0), Scalar::Unsigned16(42).into());
    limits_values.set_value(limits.element(1), Scalar::Signed16(-7).into());
    let mut gains_values = InterpretedList::defaults(gains, registry).unwrap();
    gains_values.set_value(
        gains.element(0),
        ElementValue::Array(vec![Scalar::Real32(1.5), Scalar::Real32(2.0)]),
    );

    let mut file = ParamSetFile::new(info());
    file.upsert_list(gains, Some(0x1A2B), ListContent::Interpreted(gains_values), registry)
        .unwrap();
    file.upsert_list(limits, Some(0x00FF), ListContent::Interpreted(limits_values), registry)
        .unwrap();
    file
}

#[test]
fn test_roundtrip_is_byte_identical() {
    let registry = registry();
    let file = sample_file(&registry);

    let first = save_parameter_set_file_to_string(&file).expect("save failed");
    let loaded = load_parameter_set_file_from_str(&first).expect("load failed");
    assert_eq!(loaded, file);

    let second = save_parameter_set_file_to_string(&loaded).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_roundtrip_through_disk() {
    let _ = env_logger::builder().is_test(true).try_init();
    let registry = registry();
    let file = sample_file(&registry);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("values.psf");

    save_parameter_set_file(&file, &path).unwrap();
    let loaded = load_parameter_set_file(&path).unwrap();
    assert_eq!(loaded, file);
    assert_eq!(loaded.info.user_comment, "values & <limits>");
    assert_eq!(
        loaded.list_locators(),
        vec![ListLocator::new(3, 0, 0), ListLocator::new(3, 0, 1)]
    );
    assert_eq!(loaded.list(ListLocator::new(3, 0, 1)).unwrap().crc, Some(0x1A2B));
}

#[test]
fn test_clean_file_needs_unchecked_loader() {
    let registry = registry();
    let file = sample_file(&registry);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clean.psf");

    save_clean_parameter_set_file(&file, &path).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert!(!text.contains("checksum="));

    assert!(matches!(
        load_parameter_set_file(&path),
        Err(PsfError::MissingAttribute {
            attribute: "checksum",
            ..
        })
    ));

    let loaded = load_parameter_set_file_unchecked(&path).unwrap();
    assert!(loaded.lists().all(|(_, list)| list.crc.is_none()));
    assert_eq!(validate_against_schema(&loaded, &registry).unwrap().len(), 2);
}

#[test]
fn test_validate_against_schema() {
    let registry = registry();
    let file = sample_file(&registry);
    assert_eq!(
        validate_against_schema(&file, &registry).unwrap(),
        vec![ListLocator::new(3, 0, 0), ListLocator::new(3, 0, 1)]
    );

    let mut wrong_type = file.clone();
    if let ListContent::Interpreted(list) =
        &mut wrong_type.list_mut(ListLocator::new(3, 0, 0)).unwrap().content
    {
        list.elements[0].value = Scalar::Unsigned32(42).into();
    }
    assert!(matches!(
        validate_against_schema(&wrong_type, &registry),
        Err(PsfError::Model(ModelError::TypeMismatch { .. }))
    ));

    let mut unknown = file.clone();
    unknown.devices[0].index = 9;
    assert!(matches!(
        validate_against_schema(&unknown, &registry),
        Err(PsfError::Model(ModelError::UnknownList(_)))
    ));
}

#[test]
fn test_check_list_crcs_reports_only_mismatches() {
    let registry = registry();
    let mut file = sample_file(&registry);
    let limits = ListLocator::new(3, 0, 0);
    let gains = ListLocator::new(3, 0, 1);

    let ListContent::Interpreted(values) = &file.list(limits).unwrap().content else {
        panic!("limits should be typed");
    };
    let good = list_checksum(&values.to_raw(&registry).unwrap().bytes);
    file.list_mut(limits).unwrap().crc = Some(good);
    file.list_mut(gains).unwrap().crc = Some(0xBEEF);

    assert_eq!(check_list_crcs(&file, &registry).unwrap(), vec![gains]);
    // A wrong crc is reported, not rejected.
    assert_eq!(validate_against_schema(&file, &registry).unwrap().len(), 2);

    file.list_mut(gains).unwrap().crc = None;
    assert!(check_list_crcs(&file, &registry).unwrap().is_empty());
}

#[test]
fn test_zero_length_array_keeps_its_type() {
    let mut registry = DeviceRegistry::new();
    registry.insert(
        0,
        DeviceDefinition::new("Node").with_pool(
            PoolDefinition::new("Spare", Endianness::Little).with_list(
                ListDefinition::new("Reserved", 0x40)
                    .with_element(ElementDefinition::array("slots", ElementType::Signed16, 0))
                    .with_element(ElementDefinition::scalar("flag", ElementType::Unsigned8)),
            ),
        ),
    );
    let list = ListLocator::new(0, 0, 0);
    let mut file = ParamSetFile::new(info());
    let values = InterpretedList::defaults(list, &registry).unwrap();
    file.upsert_list(list, None, ListContent::Interpreted(values), &registry)
        .unwrap();

    let text = save_parameter_set_file_to_string(&file).unwrap();
    assert!(text.contains("type=\"sint16\""));
    assert!(!text.contains("type=\"\""));

    let loaded = load_parameter_set_file_from_str(&text).unwrap();
    assert_eq!(loaded, file);
    assert_eq!(validate_against_schema(&loaded, &registry).unwrap(), vec![list]);
    assert_eq!(save_parameter_set_file_to_string(&loaded).unwrap(), text);
}

#[test]
fn test_nan_payload_survives_file_roundtrip() {
    let registry = registry();
    let gains = ListLocator::new(3, 0, 1);
    let mut file = sample_file(&registry);
    let payload = f32::from_bits(0x7FC0_1234);
    if let ListContent::Interpreted(values) = &mut file.list_mut(gains).unwrap().content {
        values.set_value(
            gains.element(0),
            ElementValue::Array(vec![Scalar::Real32(payload), Scalar::Real32(-0.0)]),
        );
    }

    let text = save_parameter_set_file_to_string(&file).unwrap();
    let loaded = load_parameter_set_file_from_str(&text).unwrap();
    let ListContent::Interpreted(values) = &loaded.list(gains).unwrap().content else {
        panic!("gains should be typed");
    };
    let ElementValue::Array(scalars) = &values.elements[0].value else {
        panic!("gains should be an array");
    };
    assert!(scalars[0].same_bits(&Scalar::Real32(payload)));
    assert!(scalars[1].same_bits(&Scalar::Real32(-0.0)));
    assert_eq!(save_parameter_set_file_to_string(&loaded).unwrap(), text);
}

#[test]
fn test_padded_text_roundtrip_is_byte_identical() {
    let registry = registry();
    let mut file = sample_file(&registry);
    file.info.user_comment = "  padded note \n".into();

    let first = save_parameter_set_file_to_string(&file).unwrap();
    let loaded = load_parameter_set_file_from_str(&first).unwrap();
    assert_eq!(loaded.info.user_comment, "  padded note \n");
    assert_eq!(save_parameter_set_file_to_string(&loaded).unwrap(), first);
}

#[test]
fn test_legacy_version_1_loads_raw_bytes() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<parameter-set-file>
  <file-version>1</file-version>
  <devices>
    <device index="3" name="Gateway">
      <data-pools>
        <data-pool index="0" name="Calibration" endianness="big">
          <lists>
            <list index="0" name="Limits" crc="0x00FF">
              <raw start-address="0x00001000">002AFFF9</raw>
            </list>
          </lists>
        </data-pool>
      </data-pools>
    </device>
  </devices>
</parameter-set-file>"#;

    let file = load_parameter_set_file_from_str_unchecked(xml).unwrap();
    assert_eq!(file.version, FileVersion::V1);
    assert!(file.has_raw_content());
    assert_eq!(file.info, FileInfo::default());

    let locator = ListLocator::new(3, 0, 0);
    let list = file.list(locator).unwrap();
    assert_eq!(list.crc, Some(0x00FF));
    assert_eq!(
        list.content,
        ListContent::Raw(RawEntry::new(0x1000, vec![0x00, 0x2A, 0xFF, 0xF9]))
    );

    // The raw bytes still decode through the schema when one is available.
    let registry = registry();
    let typed = list.content.to_interpreted(locator, &registry).unwrap();
    assert_eq!(typed.elements[0].value, ElementValue::Scalar(Scalar::Unsigned16(42)));
    assert_eq!(typed.elements[1].value, ElementValue::Scalar(Scalar::Signed16(-7)));

    // And the legacy file writes back as version 1.
    let text = save_parameter_set_file_to_string(&file).unwrap();
    let again = load_parameter_set_file_from_str(&text).unwrap();
    assert_eq!(again, file);
}

#[test]
fn test_legacy_version_1_requires_raw() {
    let xml = r#"<parameter-set-file>
  <file-version>1</file-version>
  <devices><device index="0"><data-pools><data-pool index="0" endianness="little"><lists>
    <list index="0" start-address="0x00000000"><elements/></list>
  </lists></data-pool></data-pools></device></devices>
</parameter-set-file>"#;
    assert!(matches!(
        load_parameter_set_file_from_str_unchecked(xml),
        Err(PsfError::MissingElement { element: "raw", .. })
    ));
}
