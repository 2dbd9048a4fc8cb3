//! Save/load round trips and rejection of damaged model directories.

mod common;

use std::fs;

use chrono::Duration;
use ionmodel::persistence::{DTYPE, FORMAT_VERSION, MANIFEST_FILE};
use ionmodel::{
    ChapmanSource, IonModel, IonModelError, Layer, Quantity, QueryOptions, SkyDirection,
};
use test_utils::{frequencies, model_dir, time};

use common::coarse_model;

fn query_points() -> Vec<SkyDirection> {
    vec![
        SkyDirection::zenith(),
        SkyDirection::new(45.0, 0.0),
        SkyDirection::new(10.0, 250.0),
        SkyDirection::new(2.0, 90.0),
    ]
}

#[test]
fn test_round_trip_reproduces_queries() {
    let model = coarse_model();
    let dir = model_dir();
    let path = model.save(dir.path(), None).unwrap();
    assert_eq!(path.file_name().unwrap(), "ionmodel_202401151200_202401151500");

    let loaded = IonModel::load(&path).unwrap();
    assert_eq!(loaded.config(), model.config());
    assert_eq!(loaded.time_axis(), model.time_axis());
    assert_eq!(loaded.lattice(Layer::F).pixels(), model.lattice(Layer::F).pixels());

    let opts = QueryOptions::new();
    for minutes in [0, 20, 90, 180] {
        let dt = time::minutes_after(minutes);
        for dir in query_points() {
            assert_eq!(loaded.ded(dir, dt, &opts).unwrap(), model.ded(dir, dt, &opts).unwrap());
            assert_eq!(loaded.fet(dir, dt, &opts).unwrap(), model.fet(dir, dt, &opts).unwrap());
            assert_eq!(
                loaded.atten(dir, dt, frequencies::HF_10, &opts).unwrap(),
                model.atten(dir, dt, frequencies::HF_10, &opts).unwrap()
            );
            assert_eq!(
                loaded.refr(dir, dt, frequencies::VHF_50, &opts).unwrap(),
                model.refr(dir, dt, frequencies::VHF_50, &opts).unwrap()
            );
        }
    }
}

#[test]
fn test_writes_expected_files() {
    let model = coarse_model();
    let dir = model_dir();
    let path = model.save(dir.path(), Some("snapshot")).unwrap();
    assert_eq!(path, dir.path().join("snapshot"));

    let manifest: serde_json::Value =
        serde_json::from_slice(&fs::read(path.join(MANIFEST_FILE)).unwrap()).unwrap();
    assert_eq!(manifest["format_version"], FORMAT_VERSION);
    assert_eq!(manifest["dtype"], DTYPE);

    let (n_times, n_pixels, n_alt) = (
        model.time_axis().len(),
        model.lattice(Layer::D).pixels().len(),
        model.lattice(Layer::D).altitudes().len(),
    );
    let ded = fs::read(path.join("ded.bin")).unwrap();
    assert_eq!(ded.len(), n_times * n_pixels * n_alt * 8);
    let first = f64::from_le_bytes(ded[..8].try_into().unwrap());
    assert_eq!(first, model.stored_value(Layer::D, Quantity::Density, 0, 0, 0).unwrap());
    for name in ["det.bin", "fed.bin", "fet.bin"] {
        assert!(path.join(name).is_file(), "{} missing", name);
    }
}

#[test]
fn test_extended_axis_survives_round_trip() {
    let model = coarse_model();
    let late = time::hours_after(6) + Duration::minutes(30);
    let before = model
        .fed(SkyDirection::zenith(), late, &QueryOptions::new().recalc(true))
        .unwrap();

    let dir = model_dir();
    let loaded = IonModel::load(model.save(dir.path(), None).unwrap()).unwrap();
    assert_eq!(loaded.time_axis().len(), 6);
    let after = loaded
        .fed(SkyDirection::zenith(), late, &QueryOptions::new())
        .unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_loaded_model_needs_source_for_recalc() {
    let model = coarse_model();
    let dir = model_dir();
    let path = model.save(dir.path(), None).unwrap();
    let late = time::hours_after(10);

    let loaded = IonModel::load(&path).unwrap();
    let err = loaded
        .ded(SkyDirection::zenith(), late, &QueryOptions::new().recalc(true))
        .unwrap_err();
    assert!(matches!(err, IonModelError::Configuration(_)));

    let loaded = IonModel::load(&path).unwrap().with_source(ChapmanSource::default());
    assert!(loaded
        .ded(SkyDirection::zenith(), late, &QueryOptions::new().recalc(true))
        .is_ok());
}

#[test]
fn test_missing_array_is_rejected() {
    let model = coarse_model();
    let dir = model_dir();
    let path = model.save(dir.path(), None).unwrap();
    fs::remove_file(path.join("fet.bin")).unwrap();
    assert!(matches!(IonModel::load(&path), Err(IonModelError::Persistence(_))));
}

#[test]
fn test_truncated_array_is_rejected() {
    let model = coarse_model();
    let dir = model_dir();
    let path = model.save(dir.path(), None).unwrap();
    let bytes = fs::read(path.join("ded.bin")).unwrap();
    fs::write(path.join("ded.bin"), &bytes[..bytes.len() - 8]).unwrap();
    assert!(matches!(IonModel::load(&path), Err(IonModelError::Persistence(_))));
}

#[test]
fn test_nan_in_array_is_rejected() {
    let model = coarse_model();
    let dir = model_dir();
    let path = model.save(dir.path(), None).unwrap();
    let mut bytes = fs::read(path.join("fed.bin")).unwrap();
    bytes[8..16].copy_from_slice(&f64::NAN.to_le_bytes());
    fs::write(path.join("fed.bin"), bytes).unwrap();
    assert!(matches!(IonModel::load(&path), Err(IonModelError::Persistence(_))));
}

#[test]
fn test_manifest_mismatches_are_rejected() {
    let model = coarse_model();
    let dir = model_dir();
    let path = model.save(dir.path(), None).unwrap();
    let manifest_path = path.join(MANIFEST_FILE);
    let saved: serde_json::Value =
        serde_json::from_slice(&fs::read(&manifest_path).unwrap()).unwrap();

    let edits: [(&str, serde_json::Value); 3] = [
        ("format_version", serde_json::json!(FORMAT_VERSION + 1)),
        ("dtype", serde_json::json!("<f4")),
        ("d_pixels", serde_json::json!([0, 1])),
    ];
    for (key, value) in edits {
        let mut manifest = saved.clone();
        manifest[key] = value;
        fs::write(&manifest_path, serde_json::to_vec(&manifest).unwrap()).unwrap();
        assert!(
            matches!(IonModel::load(&path), Err(IonModelError::Persistence(_))),
            "{} edit was accepted",
            key
        );
    }

    fs::write(&manifest_path, b"{ not json").unwrap();
    assert!(matches!(IonModel::load(&path), Err(IonModelError::Persistence(_))));
}

#[test]
fn test_damaged_time_axis_is_rejected() {
    use serde_json::{json, Value};

    let model = coarse_model();
    let dir = model_dir();
    let path = model.save(dir.path(), None).unwrap();
    let manifest_path = path.join(MANIFEST_FILE);
    let saved: Value = serde_json::from_slice(&fs::read(&manifest_path).unwrap()).unwrap();
    assert_eq!(saved["time_axis"]["step_seconds"], json!(3600));
    assert_eq!(saved["time_axis"]["instants"].as_array().unwrap().len(), 4);

    fn instants(m: &mut Value) -> &mut Vec<Value> {
        m["time_axis"]["instants"].as_array_mut().unwrap()
    }
    let edits: [(&str, fn(&mut Value)); 9] = [
        ("swapped instants", |m: &mut Value| instants(m).swap(1, 2)),
        ("misaligned instant", |m: &mut Value| {
            instants(m)[1] = json!("2024-01-15T13:30:00Z")
        }),
        ("empty axis", |m: &mut Value| instants(m).clear()),
        ("zero step", |m: &mut Value| m["time_axis"]["step_seconds"] = json!(0)),
        ("foreign step", |m: &mut Value| m["time_axis"]["step_seconds"] = json!(1800)),
        ("shifted origin", |m: &mut Value| {
            m["time_axis"]["origin"] = json!("2024-01-15T11:00:00Z")
        }),
        ("missing instant", |m: &mut Value| {
            instants(m).remove(1);
        }),
        ("extra instant", |m: &mut Value| instants(m).push(json!("2024-01-15T18:00:00Z"))),
        ("stretched shape", |m: &mut Value| m["shapes"]["fed"][0] = json!(5)),
    ];
    for (what, edit) in edits {
        let mut manifest = saved.clone();
        edit(&mut manifest);
        fs::write(&manifest_path, serde_json::to_vec(&manifest).unwrap()).unwrap();
        assert!(
            matches!(IonModel::load(&path), Err(IonModelError::Persistence(_))),
            "{} was accepted",
            what
        );
    }

    fs::write(&manifest_path, serde_json::to_vec(&saved).unwrap()).unwrap();
    assert!(IonModel::load(&path).is_ok());
}

#[test]
fn test_missing_directory() {
    let dir = model_dir();
    assert!(matches!(
        IonModel::load(dir.path().join("nothing-here")),
        Err(IonModelError::Persistence(_))
    ));
}

#[test]
fn test_rejects_path_like_names() {
    let model = coarse_model();
    let dir = model_dir();
    assert!(model.save(dir.path(), Some("a/b")).is_err());
    assert!(model.save(dir.path(), Some("")).is_err());
}
