use image::{Rgba, RgbaImage};
use tree_atlas_core::prelude::*;

fn packed() -> PackOutput {
    let cfg = PackerConfig::builder()
        .with_dimensions(64, 64)
        .margin(1)
        .build();
    let inputs = vec![
        SourceImage::new("red", RgbaImage::from_pixel(8, 8, Rgba([255, 0, 0, 255]))),
        SourceImage::new("blue", RgbaImage::from_pixel(4, 12, Rgba([0, 0, 255, 128]))),
    ];
    pack_images(inputs, cfg).expect("pack")
}

#[test]
fn writes_png_and_xml() {
    let dir = tempfile::tempdir().expect("tempdir");
    let atlas_path = dir.path().join("atlas.png");
    let desc_path = dir.path().join("description.xml");
    let out = packed();

    write_outputs(&out, &atlas_path, &desc_path, DescriptionFormat::Xml).expect("write");

    let decoded = image::open(&atlas_path).expect("decode").to_rgba8();
    assert_eq!(decoded.dimensions(), (64, 64));
    assert_eq!(decoded, out.rgba);
    let xml = std::fs::read_to_string(&desc_path).expect("read xml");
    assert!(xml.contains(r#"cntFrames="2""#));

    // Only the two artifacts remain; no staging files.
    let entries = std::fs::read_dir(dir.path()).expect("read dir").count();
    assert_eq!(entries, 2);
}

#[test]
fn writes_json_description() {
    let dir = tempfile::tempdir().expect("tempdir");
    let atlas_path = dir.path().join("atlas.png");
    let desc_path = dir.path().join("atlas.json");
    let out = packed();

    write_outputs(&out, &atlas_path, &desc_path, DescriptionFormat::Json).expect("write");

    let text = std::fs::read_to_string(&desc_path).expect("read json");
    let v: serde_json::Value = serde_json::from_str(&text).expect("parse");
    assert_eq!(v["description"]["count"], 2);
}

#[test]
fn failed_description_leaves_no_atlas() {
    let dir = tempfile::tempdir().expect("tempdir");
    let atlas_path = dir.path().join("atlas.png");
    let desc_path = dir.path().join("missing").join("description.xml");
    let out = packed();

    let result = write_outputs(&out, &atlas_path, &desc_path, DescriptionFormat::Xml);
    assert!(result.is_err());
    assert!(!atlas_path.exists());
    assert_eq!(std::fs::read_dir(dir.path()).expect("read dir").count(), 0);
}

#[test]
fn description_rename_failure_removes_atlas() {
    let dir = tempfile::tempdir().expect("tempdir");
    let atlas_path = dir.path().join("atlas.png");
    // A non-empty directory in the way: staging succeeds, the rename fails.
    let desc_path = dir.path().join("description.xml");
    std::fs::create_dir(&desc_path).expect("mkdir");
    std::fs::write(desc_path.join("keep.txt"), "x").expect("seed");
    let out = packed();

    // The error owns the staged file until it is dropped.
    let failed = write_outputs(&out, &atlas_path, &desc_path, DescriptionFormat::Xml).is_err();
    assert!(failed);
    assert!(!atlas_path.exists());
    assert!(desc_path.is_dir());
    // Only the blocking directory remains.
    assert_eq!(std::fs::read_dir(dir.path()).expect("read dir").count(), 1);
}

#[test]
fn nothing_placed_still_writes_both_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let atlas_path = dir.path().join("atlas.png");
    let desc_path = dir.path().join("description.xml");
    let cfg = PackerConfig::builder()
        .with_dimensions(63, 63)
        .margin(0)
        .build();
    let out = pack_images(vec![SourceImage::new("big", RgbaImage::new(64, 64))], cfg).expect("pack");
    assert_eq!(out.unplaced, vec!["big".to_string()]);

    write_outputs(&out, &atlas_path, &desc_path, DescriptionFormat::Xml).expect("write");

    let decoded = image::open(&atlas_path).expect("decode").to_rgba8();
    assert_eq!(decoded.dimensions(), (63, 63));
    assert!(decoded.pixels().all(|p| p.0 == [0, 0, 0, 0]));
    let xml = std::fs::read_to_string(&desc_path).expect("read xml");
    assert!(xml.contains(r#"cntFrames="0""#));
    assert!(!xml.contains("<frame "));
}

#[test]
fn write_atomic_replaces_existing_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("note.txt");
    std::fs::write(&path, "old").expect("seed");
    tree_atlas_core::write_atomic(&path, b"new").expect("write");
    assert_eq!(std::fs::read_to_string(&path).expect("read"), "new");
}
