use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glyphidx_core::{IdxError, IdxHeader, IdxWriter, LabelPolicy};
use glyphidx_observe::progress::Progress;
use image::imageops::FilterType;
use tracing::{info, warn};
use zip::ZipArchive;

use crate::sample::{filter_name, normalize_entry, GrayscaleResize, SampleNormalizer};
use crate::PackError;

/// Which pair of output files an archive entry lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subset {
    /// Everything whose variant folder does not start with `train`.
    Hsf,
    Train,
}

impl Subset {
    pub fn name(self) -> &'static str {
        match self {
            Subset::Hsf => "hsf",
            Subset::Train => "train",
        }
    }
}

/// Subset and class code of an archive entry that should be packed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryClass {
    pub subset: Subset,
    pub class_code: u32,
}

/// Classifies a zip entry name of the form `<root>/<class-hex>/<variant>/<file>.png`.
///
/// Returns `Ok(None)` for entries that are skipped: a missing or empty class or
/// variant segment, or a name not ending in `.png` (any case). A class segment
/// that is not hexadecimal is an error.
pub fn classify_entry(name: &str) -> Result<Option<EntryClass>, PackError> {
    let name = name.replace('\\', "/");
    let mut segments = name.split('/');
    let _root = segments.next();
    let class_seg = segments.next().unwrap_or("");
    let variant = segments.next().unwrap_or("");
    if class_seg.is_empty() || variant.is_empty() {
        return Ok(None);
    }
    if !name.to_ascii_lowercase().ends_with(".png") {
        return Ok(None);
    }

    let digits = class_seg.trim();
    let digits = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .unwrap_or(digits);
    let class_code =
        u32::from_str_radix(digits, 16).map_err(|_| PackError::BadClassCode {
            entry: name.clone(),
            segment: class_seg.to_string(),
        })?;

    let subset = if variant.starts_with("train") {
        Subset::Train
    } else {
        Subset::Hsf
    };
    Ok(Some(EntryClass { subset, class_code }))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsetPaths {
    pub images: PathBuf,
    pub labels: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackOutputs {
    pub hsf: SubsetPaths,
    pub train: SubsetPaths,
}

impl PackOutputs {
    pub fn all(&self) -> [&Path; 4] {
        [
            &self.hsf.images,
            &self.hsf.labels,
            &self.train.images,
            &self.train.labels,
        ]
    }
}

/// `<out>/<subset>-<prefix>-{images-idx3,labels-idx1}-ubyte.idx` for both subsets.
pub fn output_paths(out_dir: &Path, name_prefix: &str) -> PackOutputs {
    let paths = |subset: Subset| SubsetPaths {
        images: out_dir.join(format!(
            "{}-{name_prefix}-images-idx3-ubyte.idx",
            subset.name()
        )),
        labels: out_dir.join(format!(
            "{}-{name_prefix}-labels-idx1-ubyte.idx",
            subset.name()
        )),
    };
    PackOutputs {
        hsf: paths(Subset::Hsf),
        train: paths(Subset::Train),
    }
}

#[derive(Debug, Clone)]
pub struct PackZipConfig {
    pub archive: PathBuf,
    pub out_dir: PathBuf,
    pub name_prefix: String,
    pub width: u32,
    pub height: u32,
    pub label_policy: LabelPolicy,
    pub filter: FilterType,
    pub show_progress: bool,
}

#[derive(Debug, Clone)]
pub struct PackZipResult {
    pub hsf: u32,
    pub train: u32,
    /// Archive entries excluded by the layout rules (directories, non-png, ...).
    pub skipped: u64,
    /// Distinct class code points, ascending.
    pub classes: Vec<u32>,
    pub label_policy: LabelPolicy,
    pub outputs: PackOutputs,
}

impl PackZipResult {
    pub fn total(&self) -> u64 {
        u64::from(self.hsf) + u64::from(self.train)
    }

    /// Classes rendered as characters; code points that are not valid chars become U+FFFD.
    pub fn class_chars(&self) -> String {
        self.classes
            .iter()
            .map(|c| char::from_u32(*c).unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()
    }

    /// `hsf: <n> train: <m> classes: <k> policy: <policy>`
    pub fn summary(&self) -> String {
        format!(
            "hsf: {} train: {} classes: {} policy: {}",
            self.hsf,
            self.train,
            self.classes.len(),
            self.label_policy
        )
    }
}

struct PlannedEntry {
    index: usize,
    name: String,
    subset: Subset,
    label: u8,
}

struct Plan {
    entries: Vec<PlannedEntry>,
    hsf: u32,
    train: u32,
    skipped: u64,
    classes: BTreeSet<u32>,
}

fn plan_entries<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    policy: LabelPolicy,
) -> Result<Plan> {
    let mut plan = Plan {
        entries: Vec::with_capacity(archive.len()),
        hsf: 0,
        train: 0,
        skipped: 0,
        classes: BTreeSet::new(),
    };

    for index in 0..archive.len() {
        let name = archive
            .by_index_raw(index)
            .with_context(|| format!("read zip entry #{index} failed"))?
            .name()
            .to_string();

        let Some(class) = classify_entry(&name)? else {
            plan.skipped += 1;
            continue;
        };
        let label = policy
            .encode(class.class_code)
            .map_err(|source| PackError::Label {
                entry: name.clone(),
                source,
            })?;

        let count = match class.subset {
            Subset::Hsf => &mut plan.hsf,
            Subset::Train => &mut plan.train,
        };
        *count = count
            .checked_add(1)
            .ok_or(PackError::TooManyEntries {
                subset: class.subset.name(),
            })?;
        plan.classes.insert(class.class_code);
        plan.entries.push(PlannedEntry {
            index,
            name,
            subset: class.subset,
            label,
        });
    }
    Ok(plan)
}

/// Output files written under `.tmp` names and renamed into place on commit.
///
/// Dropping without `commit` removes every temp file. A failed `commit`
/// removes the outputs it already renamed, so a failed pack never leaves any
/// of its outputs behind.
struct StagedOutputs {
    staged: Vec<(PathBuf, PathBuf)>,
    committed: bool,
}

impl StagedOutputs {
    fn new() -> Self {
        Self {
            staged: Vec::with_capacity(4),
            committed: false,
        }
    }

    fn stage(&mut self, path: &Path) -> PathBuf {
        let mut name = path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        let tmp = path.with_file_name(name);
        self.staged.push((tmp.clone(), path.to_path_buf()));
        tmp
    }

    fn commit(mut self) -> Result<()> {
        for (i, (tmp, path)) in self.staged.iter().enumerate() {
            if let Err(err) = std::fs::rename(tmp, path) {
                for (_, done) in &self.staged[..i] {
                    let _ = std::fs::remove_file(done);
                }
                return Err(err).with_context(|| {
                    format!("rename {} -> {} failed", tmp.display(), path.display())
                });
            }
        }
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedOutputs {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        for (tmp, _) in &self.staged {
            let _ = std::fs::remove_file(tmp);
        }
    }
}

struct SubsetWriters {
    images: IdxWriter<BufWriter<File>>,
    labels: IdxWriter<BufWriter<File>>,
}

impl SubsetWriters {
    fn create(
        paths: &SubsetPaths,
        staged: &mut StagedOutputs,
        count: u32,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let images_tmp = staged.stage(&paths.images);
        let images = IdxWriter::create(&images_tmp, IdxHeader::images(count, height, width))
            .with_context(|| format!("create {} failed", images_tmp.display()))?;
        let labels_tmp = staged.stage(&paths.labels);
        let labels = IdxWriter::create(&labels_tmp, IdxHeader::labels(count))
            .with_context(|| format!("create {} failed", labels_tmp.display()))?;
        Ok(Self { images, labels })
    }

    fn push(&mut self, label: u8, pixels: &[u8]) -> Result<(), IdxError> {
        self.images.push(pixels)?;
        self.labels.push(&[label])
    }

    fn finish(self) -> Result<(), IdxError> {
        self.images.finish()?;
        self.labels.finish()?;
        Ok(())
    }
}

pub fn pack_zip(cfg: &PackZipConfig) -> Result<PackZipResult> {
    let normalizer = GrayscaleResize {
        width: cfg.width,
        height: cfg.height,
        filter: cfg.filter,
    };
    pack_zip_with(cfg, &normalizer)
}

/// Packs `cfg.archive` into four IDX files using `normalizer` for pixel data.
///
/// Pass one lists and classifies every entry (no output is created if any
/// class code is bad); pass two streams each image into writers whose headers
/// already carry the exact per-subset counts.
pub fn pack_zip_with<N: SampleNormalizer + ?Sized>(
    cfg: &PackZipConfig,
    normalizer: &N,
) -> Result<PackZipResult> {
    let (width, height) = (cfg.width, cfg.height);
    if width == 0 || height == 0 || width.checked_mul(height).is_none() {
        return Err(PackError::BadDimensions { width, height }.into());
    }
    anyhow::ensure!(
        normalizer.target() == (width, height),
        "normalizer target {:?} does not match {width}x{height}",
        normalizer.target()
    );
    anyhow::ensure!(
        !cfg.name_prefix.is_empty() && !cfg.name_prefix.contains(['/', '\\']),
        "name prefix must be non-empty and must not contain path separators: {:?}",
        cfg.name_prefix
    );
    anyhow::ensure!(
        cfg.archive.is_file(),
        "archive not found: {}",
        cfg.archive.display()
    );

    info!(
        target: "glyphidx",
        event = "pack_start",
        archive = %cfg.archive.display(),
        out_dir = %cfg.out_dir.display(),
        name_prefix = cfg.name_prefix.as_str(),
        width,
        height,
        label_policy = cfg.label_policy.name(),
        filter = filter_name(cfg.filter),
        "pack starting"
    );

    let file = File::open(&cfg.archive)
        .with_context(|| format!("open archive failed: {}", cfg.archive.display()))?;
    let mut archive = ZipArchive::new(BufReader::new(file))
        .with_context(|| format!("read zip directory failed: {}", cfg.archive.display()))?;

    let plan = plan_entries(&mut archive, cfg.label_policy)?;
    info!(
        target: "glyphidx",
        event = "pack_plan",
        entries = archive.len() as u64,
        hsf = plan.hsf,
        train = plan.train,
        skipped = plan.skipped,
        classes = plan.classes.len() as u64,
        "archive scanned"
    );
    for (subset, count) in [(Subset::Hsf, plan.hsf), (Subset::Train, plan.train)] {
        if count == 0 {
            warn!(
                target: "glyphidx",
                event = "pack_empty_subset",
                subset = subset.name(),
                "subset has no entries; writing header-only files"
            );
        }
    }

    std::fs::create_dir_all(&cfg.out_dir)
        .with_context(|| format!("create output dir failed: {}", cfg.out_dir.display()))?;
    let outputs = output_paths(&cfg.out_dir, &cfg.name_prefix);
    for path in outputs.all() {
        anyhow::ensure!(
            !path.exists() || path.is_file(),
            "output path exists and is not a regular file: {}",
            path.display()
        );
    }

    let mut staged = StagedOutputs::new();
    let mut hsf_out = SubsetWriters::create(&outputs.hsf, &mut staged, plan.hsf, width, height)?;
    let mut train_out =
        SubsetWriters::create(&outputs.train, &mut staged, plan.train, width, height)?;

    let mut progress = cfg
        .show_progress
        .then(|| Progress::stderr(plan.entries.len() as u64));
    let mut bytes: Vec<u8> = Vec::new();

    for planned in &plan.entries {
        bytes.clear();
        {
            let mut entry = archive
                .by_index(planned.index)
                .with_context(|| format!("open zip entry failed: {:?}", planned.name))?;
            entry
                .read_to_end(&mut bytes)
                .with_context(|| format!("read zip entry failed: {:?}", planned.name))?;
        }

        let pixels = normalize_entry(normalizer, &planned.name, &bytes)?;
        let out = match planned.subset {
            Subset::Hsf => &mut hsf_out,
            Subset::Train => &mut train_out,
        };
        out.push(planned.label, &pixels)
            .with_context(|| format!("write entry failed: {:?}", planned.name))?;

        if let Some(p) = progress.as_mut() {
            p.advance()?;
        }
    }
    if let Some(p) = progress {
        p.finish()?;
    }

    hsf_out.finish().context("finish hsf outputs failed")?;
    train_out.finish().context("finish train outputs failed")?;
    staged.commit()?;

    info!(
        target: "glyphidx",
        event = "pack_complete",
        out_dir = %cfg.out_dir.display(),
        hsf = plan.hsf,
        train = plan.train,
        classes = plan.classes.len() as u64,
        "pack complete"
    );

    Ok(PackZipResult {
        hsf: plan.hsf,
        train: plan.train,
        skipped: plan.skipped,
        classes: plan.classes.into_iter().collect(),
        label_policy: cfg.label_policy,
        outputs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_train_and_other_variants() {
        assert_eq!(
            classify_entry("by_class/41/train_41/train_41_00000.png").unwrap(),
            Some(EntryClass {
                subset: Subset::Train,
                class_code: 0x41
            })
        );
        assert_eq!(
            classify_entry("by_class/7a/hsf_0/hsf_0_00000.PNG").unwrap(),
            Some(EntryClass {
                subset: Subset::Hsf,
                class_code: 0x7a
            })
        );
    }

    #[test]
    fn skips_directories_and_other_files() {
        assert_eq!(classify_entry("by_class/").unwrap(), None);
        assert_eq!(classify_entry("by_class/41/").unwrap(), None);
        assert_eq!(classify_entry("by_class/41/train_41/").unwrap(), None);
        assert_eq!(classify_entry("by_class//train/x.png").unwrap(), None);
        assert_eq!(classify_entry("by_class/41/hsf_0/notes.txt").unwrap(), None);
        assert_eq!(classify_entry("readme.png").unwrap(), None);
    }

    #[test]
    fn bad_hex_is_an_error_naming_the_entry() {
        let err = classify_entry("by_class/zz/train_0/a.png").unwrap_err();
        match err {
            PackError::BadClassCode { entry, segment } => {
                assert_eq!(entry, "by_class/zz/train_0/a.png");
                assert_eq!(segment, "zz");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn hex_prefix_is_accepted() {
        let c = classify_entry("root/0x30/train/a.png").unwrap().unwrap();
        assert_eq!(c.class_code, 0x30);
    }

    #[test]
    fn summary_reports_counts_classes_and_policy() {
        let res = PackZipResult {
            hsf: 3,
            train: 12,
            skipped: 5,
            classes: vec![0x30, 0x41, 0x7a],
            label_policy: LabelPolicy::Ascii,
            outputs: output_paths(Path::new("/out"), "digits"),
        };
        assert_eq!(res.summary(), "hsf: 3 train: 12 classes: 3 policy: ascii");
        assert_eq!(res.class_chars(), "0Az");
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let mut root = std::env::temp_dir();
        root.push(format!(
            "glyphidx-staged-{name}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis()
        ));
        std::fs::create_dir_all(&root).unwrap();
        root
    }

    #[test]
    fn failed_commit_removes_already_renamed_outputs() {
        let root = scratch_dir("rollback");
        let finals: Vec<PathBuf> = ["a.idx", "b.idx", "c.idx"]
            .iter()
            .map(|n| root.join(n))
            .collect();
        std::fs::create_dir_all(finals[2].join("blocker")).unwrap();

        let mut staged = StagedOutputs::new();
        let tmps: Vec<PathBuf> = finals.iter().map(|p| staged.stage(p)).collect();
        for tmp in &tmps {
            std::fs::write(tmp, b"x").unwrap();
        }

        assert!(staged.commit().is_err());
        assert!(!finals[0].exists());
        assert!(!finals[1].exists());
        assert!(finals[2].is_dir());
        for tmp in &tmps {
            assert!(!tmp.exists(), "leftover {}", tmp.display());
        }
    }

    #[test]
    fn output_names_follow_idx_convention() {
        let o = output_paths(Path::new("/out"), "digits");
        assert_eq!(
            o.hsf.images,
            PathBuf::from("/out/hsf-digits-images-idx3-ubyte.idx")
        );
        assert_eq!(
            o.train.labels,
            PathBuf::from("/out/train-digits-labels-idx1-ubyte.idx")
        );
    }
}
