use std::path::PathBuf;

fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_backdrop")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "backdrop.exe"
            } else {
                "backdrop"
            });
            p
        })
}

#[test]
fn cli_frame_writes_png() {
    let dir = PathBuf::from("target").join("cli_smoke");
    std::fs::create_dir_all(&dir).unwrap();

    let in_path = dir.join("in.png");
    let cfg_path = dir.join("opts.json");
    let out_path = dir.join("out.png");
    let _ = std::fs::remove_file(&out_path);

    let src = image::RgbaImage::from_fn(2, 2, |x, y| {
        if (x + y) % 2 == 0 {
            image::Rgba([250, 10, 10, 255])
        } else {
            image::Rgba([10, 10, 250, 255])
        }
    });
    src.save(&in_path).unwrap();

    let opts = serde_json::json!({
        "render": { "layout": { "stretch_xy": true } }
    });
    std::fs::write(&cfg_path, serde_json::to_vec_pretty(&opts).unwrap()).unwrap();

    let status = std::process::Command::new(exe())
        .args(["frame", "--in"])
        .arg(&in_path)
        .arg("--config")
        .arg(&cfg_path)
        .args(["--width", "8", "--height", "4", "--out"])
        .arg(&out_path)
        .status()
        .unwrap();

    assert!(status.success());
    let out = image::open(&out_path).unwrap().to_rgba8();
    assert_eq!(out.dimensions(), (8, 4));
    assert_eq!(out.get_pixel(0, 0).0, [250, 10, 10, 255]);
    assert_eq!(out.get_pixel(7, 0).0, [10, 10, 250, 255]);
}

#[test]
fn cli_layout_prints_placement() {
    let output = std::process::Command::new(exe())
        .args([
            "layout",
            "--width",
            "400",
            "--height",
            "300",
            "--source-width",
            "100",
            "--source-height",
            "50",
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    let v: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(v["placement"]["op"], "blit");
    assert_eq!(v["placement"]["dst"]["x"], 0);
    assert_eq!(v["placement"]["dst"]["width"], 100);
}

#[test]
fn cli_rejects_ambiguous_layout() {
    let dir = PathBuf::from("target").join("cli_smoke");
    std::fs::create_dir_all(&dir).unwrap();
    let cfg_path = dir.join("ambiguous.json");
    std::fs::write(
        &cfg_path,
        r#"{ "render": { "layout": { "anchor_h": ["left", "right"] } } }"#,
    )
    .unwrap();

    let status = std::process::Command::new(exe())
        .args(["layout", "--config"])
        .arg(&cfg_path)
        .args([
            "--width",
            "4",
            "--height",
            "4",
            "--source-width",
            "2",
            "--source-height",
            "2",
        ])
        .status()
        .unwrap();

    assert!(!status.success());
}
