// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
 * This module tests the image-oi-tool command-line interface. It runs the
 * program with various arguments, hopefully to keep things sensible and
 * understood.
 */

mod common;

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use assert_cmd::Command;
    use fitsio::FitsFile;

    use super::common::oifits_in_tempdir;
    use oi_imaging::fits::HduList;
    use oi_imaging::image::{GreyImage, ModelSpec, ModelType};
    use oi_imaging::*;

    fn cmd() -> Command {
        Command::cargo_bin("image-oi-tool").unwrap()
    }

    fn hdu_labels(path: &std::path::Path) -> Vec<String> {
        let mut fptr = FitsFile::open(path).unwrap();
        HduList::scan(&mut fptr)
            .unwrap()
            .iter()
            .map(|e| e.label())
            .collect()
    }

    #[test]
    fn create() {
        let (dir, data) = oifits_in_tempdir();
        let input = dir.path().join("input.fits");

        cmd()
            .arg("create")
            .arg(&data)
            .arg(&input)
            .arg("64")
            .arg("0.25")
            .arg("--model-type=gaussian")
            .arg("--model-width=2.5")
            .arg("MAXITER=50")
            .arg("TARGET=Bin_Ary")
            .assert()
            .success();
        assert_eq!(
            hdu_labels(&input),
            vec![
                INIT_IMG_NAME,
                "OI_TARGET",
                "OI_WAVELENGTH",
                "OI_VIS2",
                INPUT_PARAM_NAME
            ]
        );
        let mut fptr = FitsFile::open(&input).unwrap();
        let hdus = HduList::scan(&mut fptr).unwrap();
        assert!(hdus.primary().unwrap().extname().is_none());
        let img = GreyImage::from_imaging_file(&input, INPUT_PARAM_NAME, "INIT_IMG").unwrap();
        assert_eq!(img.naxis1(), 64);
        assert_abs_diff_eq!(img.pixel_size(), 0.25, epsilon = 1e-9);
        assert_abs_diff_eq!(img.image().sum(), 1.0, epsilon = 1e-3);

        // Exists.
        cmd()
            .arg("create")
            .arg(&data)
            .arg(&input)
            .arg("64")
            .arg("0.25")
            .assert()
            .failure();
        cmd()
            .arg("create")
            .arg("-o")
            .arg(&data)
            .arg(&input)
            .arg("32")
            .arg("0.5")
            .arg("-t")
            .arg("ld")
            .arg("--ld-alpha=1.5")
            .assert()
            .success();
        let img = GreyImage::from_imaging_file(&input, INPUT_PARAM_NAME, "INIT_IMG").unwrap();
        assert_eq!(img.naxis1(), 32);
    }

    #[test]
    fn create_bad_args() {
        let (dir, data) = oifits_in_tempdir();
        let input = dir.path().join("input.fits");

        // Unknown model.
        cmd()
            .arg("create")
            .arg(&data)
            .arg(&input)
            .arg("64")
            .arg("0.25")
            .arg("-t")
            .arg("airy")
            .assert()
            .failure();

        // Wrong type for a standard parameter.
        cmd()
            .arg("create")
            .arg(&data)
            .arg(&input)
            .arg("64")
            .arg("0.25")
            .arg("MAXITER=lots")
            .assert()
            .failure();

        // A limb-darkened disk with an infinitely bright limb.
        cmd()
            .arg("create")
            .arg(&data)
            .arg(&input)
            .arg("64")
            .arg("0.25")
            .arg("-t")
            .arg("ld")
            .arg("--ld-alpha=-1")
            .assert()
            .failure();

        // Not a KEY=VALUE pair.
        cmd()
            .arg("create")
            .arg(&data)
            .arg(&input)
            .arg("64")
            .arg("0.25")
            .arg("MAXITER")
            .assert()
            .failure();

        // Data file doesn't exist.
        cmd()
            .arg("create")
            .arg(dir.path().join("nothing.oifits"))
            .arg(&input)
            .arg("64")
            .arg("0.25")
            .assert()
            .failure();

        assert!(!input.exists());
    }

    #[test]
    fn edit_and_show() {
        let (dir, data) = oifits_in_tempdir();
        let input = dir.path().join("input.fits");
        cmd()
            .arg("create")
            .arg(&data)
            .arg(&input)
            .arg("16")
            .arg("1.0")
            .assert()
            .success();

        cmd()
            .arg("edit")
            .arg(&input)
            .arg("MAXITER=10")
            .arg("rgl_name=mem_prior2")
            .arg("MY_PARAM=T")
            .assert()
            .success();

        let output = cmd().arg("show").arg(&input).output().unwrap();
        assert!(output.status.success());
        let stdout = String::from_utf8(output.stdout).unwrap();
        assert!(stdout.starts_with("=== IMAGE-OI INPUT PARAM ===\n"));
        assert!(stdout.contains("MAXITER  = 10\n"));
        assert!(stdout.contains("RGL_NAME = mem_prior2\n"));
        assert!(stdout.contains("MY_PARAM = T\n"));
        assert!(stdout.contains(&format!("INIT_IMG = {}\n", INIT_IMG_NAME)));
        assert!(stdout.ends_with("---\n"));
        assert!(!stdout.contains("EXTNAME"));

        // Editing keeps the data.
        assert_eq!(hdu_labels(&input).len(), 5);

        cmd()
            .arg("edit")
            .arg(&input)
            .arg("HISTORY=regularization weight chosen by hand")
            .assert()
            .success();
        let mut fptr = FitsFile::open(&input).unwrap();
        let hdus = HduList::scan(&mut fptr).unwrap();
        let params = hdus.find(INPUT_PARAM_NAME).unwrap();
        assert!(params.header.cards().iter().any(|c| c.keyword == "HISTORY"
            && c.comment.as_deref() == Some("regularization weight chosen by hand")));
        let stdout = String::from_utf8(cmd().arg("show").arg(&input).output().unwrap().stdout)
            .unwrap();
        assert!(!stdout.contains("HISTORY"));

        cmd()
            .arg("edit")
            .arg(&input)
            .arg("USE_T3=SOMETIMES")
            .assert()
            .failure();
        cmd().arg("show").arg(&data).assert().failure();
    }

    #[test]
    fn copyinit_and_copyprior() {
        let (dir, data) = oifits_in_tempdir();
        let input = dir.path().join("input.fits");
        cmd()
            .arg("create")
            .arg(&data)
            .arg(&input)
            .arg("32")
            .arg("0.5")
            .assert()
            .success();

        let image = dir.path().join("image.fits");
        let spec = ModelSpec {
            kind: ModelType::Uniform,
            ..Default::default()
        };
        let mut model = GreyImage::centred_model("model", 32, 0.5, &spec).unwrap();
        model.set_image(model.image() * 3.0).unwrap();
        model.write_primary(&image, false).unwrap();

        cmd()
            .arg("copyinit")
            .arg(&input)
            .arg(&image)
            .assert()
            .success();
        let init = GreyImage::from_imaging_file(&input, INPUT_PARAM_NAME, "INIT_IMG").unwrap();
        assert_eq!(init.name, INIT_IMG_NAME);
        assert_abs_diff_eq!(init.image().sum(), 1.0, epsilon = 1e-9);
        assert!(init.image()[[16, 16]] > 0.0);

        cmd()
            .arg("copyprior")
            .arg(&input)
            .arg(&image)
            .assert()
            .success();
        assert_eq!(
            hdu_labels(&input),
            vec![
                INIT_IMG_NAME,
                PRIOR_IMG_NAME,
                "OI_TARGET",
                "OI_WAVELENGTH",
                "OI_VIS2",
                INPUT_PARAM_NAME
            ]
        );
        let prior = GreyImage::from_imaging_file(&input, INPUT_PARAM_NAME, "RGL_PRIO").unwrap();
        assert_abs_diff_eq!(prior.pixel_size(), 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(prior.image().sum(), 1.0, epsilon = 1e-9);

        cmd().arg("validate").arg(&input).assert().success();

        // Wrong size.
        let small = dir.path().join("small.fits");
        GreyImage::new("small", 16, 16, 0.5)
            .unwrap()
            .write_primary(&small, false)
            .unwrap();
        cmd()
            .arg("copyinit")
            .arg(&input)
            .arg(&small)
            .assert()
            .failure();
    }

    #[test]
    fn copyinit_needs_initial_image() {
        let (dir, data) = oifits_in_tempdir();
        let input = dir.path().join("input.fits");
        imaging_file::ImagingFile::from_data(&data)
            .unwrap()
            .write_to(&input, false)
            .unwrap();
        let image = dir.path().join("image.fits");
        GreyImage::new("model", 8, 8, 0.5)
            .unwrap()
            .write_primary(&image, false)
            .unwrap();

        cmd()
            .arg("copyinit")
            .arg(&input)
            .arg(&image)
            .assert()
            .failure();
        cmd()
            .arg("copyprior")
            .arg(&input)
            .arg(&image)
            .assert()
            .failure();
    }

    #[test]
    fn validate() {
        let (dir, data) = oifits_in_tempdir();
        let input = dir.path().join("input.fits");
        cmd()
            .arg("create")
            .arg(&data)
            .arg(&input)
            .arg("32")
            .arg("0.5")
            .arg("TARGET=Bin_Ary")
            .assert()
            .success();
        let output = cmd().arg("validate").arg(&input).output().unwrap();
        assert!(output.status.success());
        let stdout = String::from_utf8(output.stdout).unwrap();
        assert!(stdout.contains("0 error(s), 0 warning(s)"), "{}", stdout);

        cmd()
            .arg("edit")
            .arg(&input)
            .arg("WAVE_MIN=1e-5")
            .arg("WAVE_MAX=1e-6")
            .assert()
            .success();
        let output = cmd().arg("validate").arg(&input).output().unwrap();
        assert!(!output.status.success());
        let stdout = String::from_utf8(output.stdout).unwrap();
        assert!(stdout.contains("WAVE_MIN"));

        // Plain OIFITS has no input parameters.
        cmd().arg("validate").arg(&data).assert().failure();
    }
}
