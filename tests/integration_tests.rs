// Integration tests for img2laser
use img2laser::classifier::{classify, ImageType};
use img2laser::features::extract_features;
use img2laser::image_processor::load_image;
use img2laser::{analyze_file, convert, ConversionOptions, Laser, Material, MaterialColor};
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

// Create a simple test image programmatically
fn create_test_png(path: &PathBuf, width: u32, height: u32, pattern: &str) {
    let mut pixel_data: Vec<u8> = Vec::with_capacity((width * height * 4) as usize);

    for y in 0..height {
        for x in 0..width {
            let (r, g, b) = match pattern {
                "gradient" => {
                    let r = (x * 255 / width.max(1)) as u8;
                    let g = (y * 255 / height.max(1)) as u8;
                    let b = 128;
                    (r, g, b)
                }
                "checkerboard" => {
                    let size = 8;
                    let is_white = ((x / size) + (y / size)) % 2 == 0;
                    if is_white { (255, 255, 255) } else { (0, 0, 0) }
                }
                "dark" => {
                    let v = ((x + y) % 40) as u8;
                    (v + 10, v + 5, v)
                }
                "solid" => (128, 128, 128),
                _ => (255, 255, 255),
            };
            pixel_data.push(r);
            pixel_data.push(g);
            pixel_data.push(b);
            pixel_data.push(255);
        }
    }

    let img: image::RgbaImage = image::ImageBuffer::from_raw(width, height, pixel_data).unwrap();
    img.save(path).expect("Failed to save test image");
}

fn read_png(path: &PathBuf) -> image::RgbaImage {
    image::open(path).expect("Failed to open output").to_rgba8()
}

#[test]
fn test_checkerboard_is_cartoon() {
    let test_img = PathBuf::from("/tmp/img2laser_checkerboard.png");
    create_test_png(&test_img, 64, 64, "checkerboard");

    let image_data = load_image(&test_img, 2048).expect("Failed to load image");
    let features = extract_features(&image_data).expect("Failed to extract features");
    assert!(features.bw_ratio > 0.7);
    assert_eq!(classify(&features), ImageType::Cartoon);

    let _ = fs::remove_file(&test_img);
}

#[test]
fn test_uniform_gray_is_photo() {
    let test_img = PathBuf::from("/tmp/img2laser_solid.png");
    create_test_png(&test_img, 4, 4, "solid");

    let image_data = load_image(&test_img, 2048).expect("Failed to load image");
    let features = extract_features(&image_data).expect("Failed to extract features");
    assert_eq!(features.brightness, 128.0);
    assert_eq!(features.contrast, 0.0);
    assert_eq!(features.dark_ratio, 0.0);
    assert_eq!(features.bright_ratio, 0.0);
    assert!(features.peak_count <= 1);
    assert_eq!(classify(&features), ImageType::Photo);

    let _ = fs::remove_file(&test_img);
}

#[test]
fn test_convert_gradient() {
    let test_img = PathBuf::from("/tmp/img2laser_gradient.png");
    let output = PathBuf::from("/tmp/img2laser_gradient_output.png");
    create_test_png(&test_img, 50, 40, "gradient");

    let report = convert(&test_img, &output, &ConversionOptions::default()).expect("Failed to convert");
    assert_eq!(report.width, 50);
    assert_eq!(report.height, 40);
    assert_eq!(report.histogram_before.total(), 2000);
    assert_eq!(report.histogram_after.total(), 2000);
    assert_eq!(report.gamma_override, None);

    assert!(output.exists());
    let result = read_png(&output);
    assert_eq!(result.dimensions(), (50, 40));
    for p in result.pixels() {
        assert_eq!(p[0], p[1]);
        assert_eq!(p[1], p[2]);
        assert_eq!(p[3], 255);
    }

    let _ = fs::remove_file(&test_img);
    let _ = fs::remove_file(&output);
}

#[test]
fn test_dark_material_inverts_output() {
    let test_img = PathBuf::from("/tmp/img2laser_invert.png");
    let light_out = PathBuf::from("/tmp/img2laser_invert_light.png");
    let dark_out = PathBuf::from("/tmp/img2laser_invert_dark.png");
    create_test_png(&test_img, 32, 32, "gradient");

    let light = ConversionOptions {
        material: Material::Leather,
        laser: Some(Laser::Co2),
        ..Default::default()
    };
    let dark = ConversionOptions {
        color: MaterialColor::Dark,
        ..light.clone()
    };
    convert(&test_img, &light_out, &light).expect("Failed to convert light");
    convert(&test_img, &dark_out, &dark).expect("Failed to convert dark");

    let a = read_png(&light_out);
    let b = read_png(&dark_out);
    for (p, q) in a.pixels().zip(b.pixels()) {
        assert_eq!(q[0], 255 - p[0]);
    }

    let _ = fs::remove_file(&test_img);
    let _ = fs::remove_file(&light_out);
    let _ = fs::remove_file(&dark_out);
}

#[test]
fn test_load_downscales_long_side() {
    let test_img = PathBuf::from("/tmp/img2laser_wide.png");
    create_test_png(&test_img, 300, 100, "gradient");

    let image_data = load_image(&test_img, 150).expect("Failed to load image");
    assert_eq!((image_data.width, image_data.height), (150, 50));
    assert_eq!(image_data.pixels.len(), 150 * 50);

    let untouched = load_image(&test_img, 2048).expect("Failed to load image");
    assert_eq!((untouched.width, untouched.height), (300, 100));

    let _ = fs::remove_file(&test_img);
}

#[test]
fn test_analyze_report_json() {
    let test_img = PathBuf::from("/tmp/img2laser_dark.png");
    create_test_png(&test_img, 48, 48, "dark");

    let options = ConversionOptions {
        gamma: Some(1.3),
        ..Default::default()
    };
    let report = analyze_file(&test_img, &options).expect("Failed to analyze");
    assert!(report.features.dark_ratio > 0.9);
    assert_eq!(report.gamma_override, Some(1.3));
    assert_eq!(report.params.gamma, 1.3);

    let json = report.to_json().expect("Failed to serialize report");
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    for key in ["image_type", "features", "params", "depth", "gamma_effect", "summary"] {
        assert!(value.get(key).is_some(), "missing {}", key);
    }
    assert_eq!(value["selections"]["material"], "wood");

    let _ = fs::remove_file(&test_img);
}

#[test]
fn test_missing_input_fails() {
    let missing = PathBuf::from("/tmp/img2laser_does_not_exist.png");
    let output = PathBuf::from("/tmp/img2laser_never_written.png");
    assert!(convert(&missing, &output, &ConversionOptions::default()).is_err());
    assert!(!output.exists());
}

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_img2laser"))
        .args(args)
        .output()
        .expect("Failed to run img2laser")
}

fn fresh_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from("/tmp").join(name);
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("Failed to create test directory");
    dir
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

#[test]
fn test_cli_unknown_keys_fall_back() {
    let dir = fresh_dir("img2laser_cli_unknown");
    let input = dir.join("in.png");
    let output = dir.join("out.png");
    create_test_png(&input, 16, 16, "gradient");

    let result = run_cli(&[
        "-i",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "--material",
        "glass",
        "--laser",
        "uv",
        "--report",
    ]);
    assert!(
        result.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&result.stderr)
    );
    assert!(output.exists());

    let reports = stdout_json(&result);
    let selections = &reports[0]["report"]["selections"];
    assert_eq!(selections["material"], "wood");
    assert!(selections.get("laser").is_none());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_cli_directory_input() {
    let dir = fresh_dir("img2laser_cli_dir");
    let inputs = dir.join("inputs");
    let outputs = dir.join("outputs");
    fs::create_dir_all(&inputs).unwrap();
    create_test_png(&inputs.join("a.png"), 16, 16, "gradient");
    create_test_png(&inputs.join("b.png"), 16, 16, "checkerboard");
    fs::write(inputs.join("notes.txt"), "not an image").unwrap();

    let result = run_cli(&["-i", inputs.to_str().unwrap(), "-o", outputs.to_str().unwrap()]);
    assert!(
        result.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&result.stderr)
    );
    assert!(outputs.join("a_laser.png").exists());
    assert!(outputs.join("b_laser.png").exists());
    assert_eq!(fs::read_dir(&outputs).unwrap().count(), 2);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_cli_shared_stems_do_not_overwrite() {
    let dir = fresh_dir("img2laser_cli_stems");
    fs::create_dir_all(dir.join("a")).unwrap();
    fs::create_dir_all(dir.join("b")).unwrap();
    let first = dir.join("a").join("x.png");
    let second = dir.join("b").join("x.bmp");
    create_test_png(&first, 16, 16, "gradient");
    create_test_png(&second, 16, 16, "checkerboard");
    let outputs = dir.join("outputs");

    let result = run_cli(&[
        "-i",
        first.to_str().unwrap(),
        second.to_str().unwrap(),
        "-o",
        outputs.to_str().unwrap(),
    ]);
    assert!(
        result.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&result.stderr)
    );
    assert!(outputs.join("x_png_laser.png").exists());
    assert!(outputs.join("x_bmp_laser.png").exists());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_cli_flags_override_config() {
    let dir = fresh_dir("img2laser_cli_config");
    let input = dir.join("in.png");
    let output = dir.join("out.png");
    let config = dir.join("engrave.toml");
    create_test_png(&input, 16, 16, "gradient");
    fs::write(
        &config,
        "material = \"leather\"\ncolor = \"dark\"\nlaser = \"co2\"\ngamma = 1.2\n",
    )
    .unwrap();

    let result = run_cli(&[
        "-i",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "--gamma",
        "1.8",
        "--laser",
        "blue",
        "--report",
    ]);
    assert!(
        result.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&result.stderr)
    );

    let reports = stdout_json(&result);
    let report = &reports[0]["report"];
    assert_eq!(report["gamma_override"], 1.8);
    assert_eq!(report["selections"]["material"], "leather");
    assert_eq!(report["selections"]["color"], "dark");
    assert_eq!(report["selections"]["laser"], "blue");
    assert_eq!(report["params"]["invert"], true);

    let _ = fs::remove_dir_all(&dir);
}
