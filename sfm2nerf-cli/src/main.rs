use log::*;
use sfm2nerf::{
    Error, FrameRange, NormalizeSettings, NormalizedDataset, Normalizer, Result, SfmRecord, Split,
    SplitMode,
};
use std::path::{Path, PathBuf};
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(
    name = "sfm2nerf",
    about = "Turns structure-from-motion camera poses into NeRF training datasets"
)]
enum Opt {
    /// Normalize the cameras of an SfM record into a `transforms.json` dataset.
    Convert(ConvertOpt),
    /// Split a dataset into `transforms_train.json`, `transforms_test.json` and `transforms_val.json`.
    ///
    /// The files are written next to the input dataset.
    Split(SplitOpt),
}

#[derive(StructOpt, Debug)]
struct ConvertOpt {
    /// The SfM record, such as Meshroom's `cameras.sfm`.
    #[structopt(long, parse(from_os_str))]
    sfm: PathBuf,
    /// Where the dataset is written.
    #[structopt(long, parse(from_os_str))]
    out: PathBuf,
    /// The image directory relative to the output file.
    #[structopt(long)]
    images: String,
    /// The file where settings are specified.
    ///
    /// This is in the format of `sfm2nerf::NormalizeSettings`.
    #[structopt(long, parse(from_os_str))]
    settings: Option<PathBuf>,
}

#[derive(StructOpt, Debug)]
struct SplitOpt {
    /// The dataset to split.
    #[structopt(long, parse(from_os_str))]
    file: PathBuf,
    /// Use every N-th frame number for testing (the default is 3).
    #[structopt(long, conflicts_with = "ranges")]
    every: Option<u64>,
    /// Use the frame numbers in these inclusive ranges for testing, such as `10-20`.
    #[structopt(long)]
    ranges: Vec<FrameRange>,
}

impl SplitOpt {
    fn mode(&self) -> SplitMode {
        match self.every {
            Some(n) => SplitMode::Every(n),
            None if !self.ranges.is_empty() => SplitMode::Ranges(self.ranges.clone()),
            None => SplitMode::default(),
        }
    }
}

/// Reads the settings file the user named, or the defaults when none was named.
fn load_settings(path: Option<&Path>) -> Result<NormalizeSettings> {
    let path = match path {
        Some(path) => path,
        None => {
            info!("used default settings");
            return Ok(NormalizeSettings::default());
        }
    };
    let file = std::fs::File::open(path).map_err(|source| Error::Io {
        path: path.to_owned(),
        source,
    })?;
    let settings: NormalizeSettings = serde_json::from_reader(std::io::BufReader::new(file))?;
    info!("loaded settings from {}", path.display());
    Ok(settings)
}

fn convert(opt: &ConvertOpt) -> Result<()> {
    let settings = load_settings(opt.settings.as_deref())?;
    info!("loading {}", opt.sfm.display());
    let record = SfmRecord::from_path(&opt.sfm)?;
    let normalized = Normalizer::new(settings).normalize(&record, &opt.images)?;
    if !normalized.report.dropped_views.is_empty() {
        warn!(
            "{} views had no pose and were left out",
            normalized.report.dropped_views.len()
        );
    }
    info!(
        "writing {} frames to {}",
        normalized.dataset.frames.len(),
        opt.out.display()
    );
    normalized.dataset.write_path(&opt.out)
}

fn split(opt: &SplitOpt) -> Result<()> {
    let dataset = NormalizedDataset::from_path(&opt.file)?;
    let split = Split::new(&dataset, &opt.mode())?;
    let dir = opt.file.parent().unwrap_or_else(|| Path::new("."));
    split.write_dir(dir)
}

fn main() {
    pretty_env_logger::init_timed();
    let result = match Opt::from_args() {
        Opt::Convert(opt) => convert(&opt),
        Opt::Split(opt) => split(&opt),
    };
    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    const CAMERAS: &str = r#"{
        "version": ["1", "2", "0"],
        "views": [
            {"viewId": "1", "poseId": "11", "path": "/scan/1.jpg"},
            {"viewId": "2", "poseId": "12", "path": "/scan/2.jpg"},
            {"viewId": "3", "poseId": "13", "path": "/scan/3.jpg"},
            {"viewId": "4", "poseId": "14", "path": "/scan/4.jpg"}
        ],
        "intrinsics": [
            {"width": "640", "height": "480", "pxFocalLength": "500", "principalPoint": ["320", "240"]}
        ],
        "poses": [
            {"poseId": "11", "pose": {"transform": {
                "rotation": ["0", "0", "-1", "1", "0", "0", "0", "-1", "0"],
                "center": ["5", "0", "0"]}}},
            {"poseId": "12", "pose": {"transform": {
                "rotation": ["-1", "0", "0", "0", "0", "-1", "0", "-1", "0"],
                "center": ["0", "5", "0"]}}},
            {"poseId": "13", "pose": {"transform": {
                "rotation": ["0", "0", "1", "-1", "0", "0", "0", "-1", "0"],
                "center": ["-5", "0", "0"]}}}
        ]
    }"#;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn parses_subcommands() {
        let opt = Opt::from_iter(&[
            "sfm2nerf", "split", "--file", "t.json", "--ranges", "1-3", "8-9",
        ]);
        match opt {
            Opt::Split(opt) => assert_eq!(
                opt.mode(),
                SplitMode::Ranges(vec![
                    FrameRange { first: 1, last: 3 },
                    FrameRange { first: 8, last: 9 }
                ])
            ),
            other => panic!("parsed {:?}", other),
        }
        assert!(Opt::from_iter_safe(&["sfm2nerf", "split", "--file", "t", "--ranges", "x"]).is_err());
        assert!(Opt::from_iter_safe(&["sfm2nerf", "convert", "--sfm", "a.sfm"]).is_err());
    }

    #[test]
    fn split_defaults_to_every_third() {
        let opt = Opt::from_iter(&["sfm2nerf", "split", "--file", "t.json"]);
        match opt {
            Opt::Split(opt) => assert_eq!(opt.mode(), SplitMode::Every(3)),
            other => panic!("parsed {:?}", other),
        }
    }

    #[test]
    fn settings_default_only_when_not_named() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_settings(None).unwrap(), NormalizeSettings::default());
        let partial = write(dir.path(), "partial.json", r#"{"aabb_scale": 8}"#);
        let settings = load_settings(Some(partial.as_path())).unwrap();
        assert_eq!(settings.aabb_scale, 8);
        assert_eq!(
            settings.target_mean_distance,
            NormalizeSettings::default().target_mean_distance
        );
    }

    #[test]
    fn named_settings_must_load() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            load_settings(Some(missing.as_path())),
            Err(Error::Io { .. })
        ));
        let garbage = write(dir.path(), "garbage.json", "not json");
        assert!(matches!(
            load_settings(Some(garbage.as_path())),
            Err(Error::MalformedInput { .. })
        ));
        let mistyped = write(dir.path(), "mistyped.json", r#"{"aabb_scale": "8"}"#);
        assert!(matches!(
            load_settings(Some(mistyped.as_path())),
            Err(Error::MalformedInput { .. })
        ));
    }

    #[test]
    fn convert_stops_on_bad_settings() {
        let dir = tempfile::tempdir().unwrap();
        let sfm = write(dir.path(), "cameras.sfm", CAMERAS);
        let settings = write(dir.path(), "settings.json", "{");
        let out = dir.path().join("transforms.json");
        let result = convert(&ConvertOpt {
            sfm,
            out: out.clone(),
            images: "images".to_owned(),
            settings: Some(settings),
        });
        assert!(matches!(result, Err(Error::MalformedInput { .. })));
        assert!(!out.exists());
    }

    #[test]
    fn convert_then_split() {
        let dir = tempfile::tempdir().unwrap();
        let sfm = write(dir.path(), "cameras.sfm", CAMERAS);
        let out = dir.path().join("transforms.json");
        convert(&ConvertOpt {
            sfm,
            out: out.clone(),
            images: "images".to_owned(),
            settings: None,
        })
        .unwrap();

        let dataset = NormalizedDataset::from_path(&out).unwrap();
        // View 4 has no pose.
        assert_eq!(dataset.frames.len(), 3);
        assert_eq!(dataset.frames[1].file_path, "images/2.jpg");

        split(&SplitOpt {
            file: out,
            every: Some(2),
            ranges: vec![],
        })
        .unwrap();
        let test = NormalizedDataset::from_path(dir.path().join("transforms_test.json")).unwrap();
        let train = NormalizedDataset::from_path(dir.path().join("transforms_train.json")).unwrap();
        assert_eq!(test.frames.len(), 1);
        assert_eq!(test.frames[0].file_path, "images/2.jpg");
        assert_eq!(train.frames.len(), 2);
        assert!(dir.path().join("transforms_val.json").exists());
    }

    #[test]
    fn convert_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = convert(&ConvertOpt {
            sfm: dir.path().join("cameras.sfm"),
            out: dir.path().join("transforms.json"),
            images: "images".to_owned(),
            settings: None,
        });
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
