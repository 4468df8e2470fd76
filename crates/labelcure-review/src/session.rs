//! The review loop: select a candidate, ask for a verdict, commit it.
//!
//! Every committed verdict rewrites the ledger (and, for accept/delete, the
//! image's annotation file) before the next candidate is selected, so an
//! interrupted session loses at most the verdict in flight. The pristine
//! ledger and each annotation file are backed up once before their first
//! change.

use std::collections::HashSet;
use std::io;
use std::path::PathBuf;

use image::DynamicImage;
use labelcure_core::{
    find_matching_annotation, read_annotations, write_annotations, Annotation, AnnotationError,
    Category, DatasetError, DiscrepancyRecord, Ledger, ParseMode,
};
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::backup::BackupStore;
use crate::config::ReviewConfig;
use crate::error::{RecordError, ReviewError};
use crate::presenter::{Presenter, ReviewView, Verdict};
use crate::selection::{remaining, select_candidate};

/// Where the session is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReviewState {
    SelectingAdd,
    SelectingRemove,
    /// A candidate is loaded and waits for the presenter.
    AwaitingVerdict {
        index: usize,
        category: Category,
    },
    Finished,
}

impl ReviewState {
    pub fn selecting(category: Category) -> Self {
        match category {
            Category::Add => ReviewState::SelectingAdd,
            Category::Remove => ReviewState::SelectingRemove,
        }
    }
}

/// Verdict counts of one session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReviewSummary {
    pub accepted: usize,
    pub rejected: usize,
    pub deleted: usize,
    pub kept: usize,
    /// Records set aside after a failure or an inconsistency.
    pub skipped: usize,
    /// The reviewer asked to stop before the queues ran dry.
    pub quit: bool,
}

struct Pending {
    index: usize,
    image: DynamicImage,
    annotations: Vec<Annotation>,
    annotation_path: PathBuf,
}

/// Interactive curation of one ledger against its dataset.
pub struct ReviewSession<P> {
    config: ReviewConfig,
    ledger: Ledger,
    backups: BackupStore,
    presenter: P,
    state: ReviewState,
    pinned_class: Option<u32>,
    skipped: HashSet<usize>,
    pending: Option<Pending>,
    summary: ReviewSummary,
}

impl<P: Presenter> ReviewSession<P> {
    /// Load the ledger and prepare the backup directory.
    ///
    /// Treated records are loaded too: the ledger is rewritten in full.
    pub fn open(config: ReviewConfig, presenter: P) -> Result<Self, ReviewError> {
        let dir = config.dataset.dir();
        if !dir.is_dir() {
            return Err(DatasetError::NotADirectory(dir.to_path_buf()).into());
        }
        let ledger = Ledger::load(&config.ledger_path, false, config.parse_mode)?;
        let backups =
            BackupStore::open(&config.backup_dir).map_err(|source| ReviewError::BackupDir {
                path: config.backup_dir.clone(),
                source,
            })?;

        log::info!(
            "{}: {} records, {} to add, {} to remove",
            config.ledger_path.display(),
            ledger.len(),
            ledger.count_category(Category::Add, &config.policy),
            ledger.count_category(Category::Remove, &config.policy),
        );

        Ok(Self {
            config,
            ledger,
            backups,
            presenter,
            state: ReviewState::SelectingAdd,
            pinned_class: None,
            skipped: HashSet::new(),
            pending: None,
            summary: ReviewSummary::default(),
        })
    }

    pub fn state(&self) -> ReviewState {
        self.state
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn summary(&self) -> &ReviewSummary {
        &self.summary
    }

    pub fn pinned_class(&self) -> Option<u32> {
        self.pinned_class
    }

    pub fn backups(&self) -> &BackupStore {
        &self.backups
    }

    pub fn into_presenter(self) -> P {
        self.presenter
    }

    /// Drive the session until it finishes.
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "info",
            skip(self),
            fields(ledger = %self.config.ledger_path.display())
        )
    )]
    pub fn run(&mut self) -> ReviewSummary {
        while self.state != ReviewState::Finished {
            self.step();
        }
        log::info!(
            "review finished: {} accepted, {} rejected, {} deleted, {} kept, {} skipped",
            self.summary.accepted,
            self.summary.rejected,
            self.summary.deleted,
            self.summary.kept,
            self.summary.skipped,
        );
        self.summary.clone()
    }

    /// Perform one transition and return the new state.
    pub fn step(&mut self) -> ReviewState {
        self.state = match self.state {
            ReviewState::SelectingAdd => self.select(Category::Add),
            ReviewState::SelectingRemove => self.select(Category::Remove),
            ReviewState::AwaitingVerdict { index, category } => self.decide(index, category),
            ReviewState::Finished => ReviewState::Finished,
        };
        self.state
    }

    fn select(&mut self, category: Category) -> ReviewState {
        let Some(index) = self.best(category, self.pinned_class) else {
            return self.queue_exhausted(category);
        };
        match self.prepare(index, category) {
            Some(pending) => {
                self.pending = Some(pending);
                ReviewState::AwaitingVerdict { index, category }
            }
            None => {
                self.skip(index);
                ReviewState::selecting(category)
            }
        }
    }

    fn best(&self, category: Category, pinned_class: Option<u32>) -> Option<usize> {
        select_candidate(
            &self.ledger,
            &self.config.policy,
            category,
            pinned_class,
            &self.skipped,
        )
    }

    fn queue_exhausted(&mut self, category: Category) -> ReviewState {
        let other = category.other();
        if let Some(class_id) = self.pinned_class {
            let name = self.config.class_names.name(class_id);
            if self.best(other, Some(class_id)).is_some() {
                log::info!("no more '{name}' records {category}, switching to records {other}");
                return ReviewState::selecting(other);
            }
            log::info!("no more '{name}' records, releasing the class filter");
            self.pinned_class = None;
            return ReviewState::selecting(category);
        }
        if self.best(other, None).is_some() {
            log::info!("no more records {category}, switching to records {other}");
            return ReviewState::selecting(other);
        }
        log::info!("nothing left to review");
        ReviewState::Finished
    }

    /// Load what the presenter needs. `None` means the record is skipped.
    fn prepare(&self, index: usize, category: Category) -> Option<Pending> {
        let record = self.ledger.get(index)?;
        let dataset = &self.config.dataset;

        let image = match dataset.load_image(&record.image_id) {
            Ok(image) => image,
            Err(e) => {
                log::error!(
                    "{}: cannot decode image, skipping: {e}",
                    dataset.image_path(&record.image_id).display()
                );
                return None;
            }
        };

        let annotation_path = dataset.annotation_path(&record.image_id);
        let annotations = match read_annotations(&annotation_path, ParseMode::Lenient) {
            Ok(annotations) => annotations,
            Err(AnnotationError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                Vec::new()
            }
            Err(e) => {
                log::error!("cannot read annotations, skipping {record}: {e}");
                return None;
            }
        };

        if category == Category::Add
            && find_matching_annotation(&annotations, &record.to_annotation(), &self.config.policy)
                .is_some()
        {
            log::error!(
                "{}",
                RecordError::Inconsistent(format!(
                    "{record} is already in {}",
                    annotation_path.display()
                ))
            );
            return None;
        }

        Some(Pending {
            index,
            image,
            annotations,
            annotation_path,
        })
    }

    fn decide(&mut self, index: usize, category: Category) -> ReviewState {
        let Some(pending) = self.pending.take().filter(|p| p.index == index) else {
            return ReviewState::selecting(category);
        };
        let Some(record) = self.ledger.get(index).cloned() else {
            return ReviewState::selecting(category);
        };

        let overlay = self.overlay(&record, category);
        let allowed = Verdict::allowed_for(category);
        let view = ReviewView {
            image: &pending.image,
            record: &record,
            category,
            overlay: &overlay,
            allowed,
        };
        let verdict = match self.presenter.present(&view) {
            Ok(verdict) => verdict,
            Err(e) => {
                log::error!("presenter failed, ending review: {e}");
                return ReviewState::Finished;
            }
        };
        if !allowed.contains(&verdict) {
            log::error!("'{verdict}' does not apply to records {category}, skipping {record}");
            self.skip(index);
            return ReviewState::selecting(category);
        }

        let outcome = match verdict {
            Verdict::Quit => {
                self.summary.quit = true;
                return ReviewState::Finished;
            }
            Verdict::ToggleCategory => return ReviewState::selecting(category.other()),
            Verdict::ToggleFixedClass => {
                self.pinned_class = match self.pinned_class {
                    Some(_) => None,
                    None => Some(record.class_id),
                };
                match self.pinned_class {
                    Some(class_id) => log::info!(
                        "reviewing only '{}' records",
                        self.config.class_names.name(class_id)
                    ),
                    None => log::info!("reviewing all classes"),
                }
                return ReviewState::selecting(category);
            }
            Verdict::Accept => self.accept(&record, pending).map(|()| self.summary.accepted += 1),
            Verdict::Delete => self.delete(&record, pending).map(|()| self.summary.deleted += 1),
            Verdict::Reject => self
                .mark_treated(index, false)
                .map(|()| self.summary.rejected += 1),
            Verdict::Keep => self
                .mark_treated(index, false)
                .map(|()| self.summary.kept += 1),
        };

        if let Err(e) = outcome {
            log::error!("{verdict} failed, skipping {record}: {e}");
            self.skip(index);
        }
        log::info!(
            "{} to add, {} to remove left",
            remaining(&self.ledger, &self.config.policy, Category::Add, &self.skipped),
            remaining(&self.ledger, &self.config.policy, Category::Remove, &self.skipped),
        );
        ReviewState::selecting(category)
    }

    fn accept(&mut self, record: &DiscrepancyRecord, pending: Pending) -> Result<(), RecordError> {
        self.backups
            .snapshot_ledger(&self.config.ledger_path)
            .map_err(RecordError::Backup)?;
        self.backups
            .snapshot_annotations(&record.image_id, &pending.annotation_path)
            .map_err(RecordError::Backup)?;

        let annotation = record.to_annotation();
        if !annotation.is_valid() {
            log::warn!("{annotation}: box extends past the image border");
        }
        let mut annotations = pending.annotations;
        annotations.push(annotation);
        write_annotations(&pending.annotation_path, &annotations)?;
        log::debug!("{}: added {}", pending.annotation_path.display(), record);

        self.mark_treated(pending.index, true)
    }

    fn delete(&mut self, record: &DiscrepancyRecord, pending: Pending) -> Result<(), RecordError> {
        let Some(position) = find_matching_annotation(
            &pending.annotations,
            &record.to_annotation(),
            &self.config.policy,
        ) else {
            return Err(RecordError::Inconsistent(format!(
                "{record} is not in {}",
                pending.annotation_path.display()
            )));
        };

        self.backups
            .snapshot_ledger(&self.config.ledger_path)
            .map_err(RecordError::Backup)?;
        self.backups
            .snapshot_annotations(&record.image_id, &pending.annotation_path)
            .map_err(RecordError::Backup)?;

        let mut annotations = pending.annotations;
        let removed = annotations.remove(position);
        write_annotations(&pending.annotation_path, &annotations)?;
        log::debug!("{}: removed {}", pending.annotation_path.display(), removed);

        self.commit(|ledger| {
            ledger.remove(pending.index);
        })
    }

    /// Mark a record treated. An accepted detection now matches its label
    /// exactly, so its IoU becomes 1.
    fn mark_treated(&mut self, index: usize, accepted: bool) -> Result<(), RecordError> {
        self.commit(|ledger| {
            if let Some(record) = ledger.get_mut(index) {
                record.treated = true;
                if accepted {
                    record.iou = 1.0;
                }
            }
        })
    }

    /// Apply `change` to a copy of the ledger and keep it only once the
    /// ledger file has been rewritten.
    fn commit(&mut self, change: impl FnOnce(&mut Ledger)) -> Result<(), RecordError> {
        self.backups
            .snapshot_ledger(&self.config.ledger_path)
            .map_err(RecordError::Backup)?;
        let mut next = self.ledger.clone();
        change(&mut next);
        next.save(&self.config.ledger_path)?;
        self.ledger = next;
        Ok(())
    }

    fn skip(&mut self, index: usize) {
        if self.skipped.insert(index) {
            self.summary.skipped += 1;
        }
    }

    fn overlay(&self, record: &DiscrepancyRecord, category: Category) -> String {
        let names = &self.config.class_names;
        let mut text = format!(
            "{}: '{}' {category}, confidence {:.2}, iou {:.2}",
            record.image_id,
            names.name(record.class_id),
            record.confidence,
            record.iou,
        );
        if let Some(class_id) = self.pinned_class {
            text.push_str(&format!(" [only '{}']", names.name(class_id)));
        }
        text.push_str(&format!(
            "\n{} to add, {} to remove",
            remaining(&self.ledger, &self.config.policy, Category::Add, &self.skipped),
            remaining(&self.ledger, &self.config.policy, Category::Remove, &self.skipped),
        ));
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PresenterError;
    use approx::assert_relative_eq;
    use labelcure_core::{serialize_ledger, BoundingBox, DatasetLayout};
    use std::collections::VecDeque;
    use std::fs;
    use std::path::Path;

    #[derive(Default)]
    struct Script {
        verdicts: VecDeque<Verdict>,
        seen: Vec<(u32, Category)>,
    }

    impl Script {
        fn new(verdicts: &[Verdict]) -> Self {
            Self {
                verdicts: verdicts.iter().copied().collect(),
                seen: Vec::new(),
            }
        }
    }

    impl Presenter for Script {
        fn present(&mut self, view: &ReviewView<'_>) -> Result<Verdict, PresenterError> {
            self.seen.push((view.record.class_id, view.category));
            Ok(self.verdicts.pop_front().unwrap_or(Verdict::Quit))
        }
    }

    struct Broken;

    impl Presenter for Broken {
        fn present(&mut self, _view: &ReviewView<'_>) -> Result<Verdict, PresenterError> {
            Err(PresenterError::Backend("display closed".into()))
        }
    }

    struct Fixture {
        dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().expect("tempdir");
            fs::create_dir(dir.path().join("data")).expect("mkdir");
            Self { dir }
        }

        fn data(&self) -> PathBuf {
            self.dir.path().join("data")
        }

        fn ledger_path(&self) -> PathBuf {
            self.dir.path().join("results.duv")
        }

        fn backup_dir(&self) -> PathBuf {
            self.dir.path().join("backup")
        }

        fn unlabeled_image(&self, id: &str) {
            image::RgbImage::new(8, 8)
                .save(self.data().join(format!("{id}.jpg")))
                .expect("save image");
        }

        fn image(&self, id: &str, labels: &str) {
            self.unlabeled_image(id);
            fs::write(self.data().join(format!("{id}.txt")), labels).expect("write labels");
        }

        fn ledger(&self, records: &[DiscrepancyRecord]) {
            fs::write(self.ledger_path(), serialize_ledger(records)).expect("write ledger");
        }

        fn config(&self) -> ReviewConfig {
            ReviewConfig::new(self.ledger_path(), DatasetLayout::new(self.data()))
                .with_backup_dir(self.backup_dir())
        }

        fn labels(&self, id: &str) -> Vec<Annotation> {
            read_annotations(self.data().join(format!("{id}.txt")), ParseMode::Strict)
                .expect("labels")
        }

        fn backups(&self) -> Vec<String> {
            let mut names: Vec<String> = fs::read_dir(self.backup_dir())
                .expect("backup dir")
                .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();
            names
        }
    }

    fn to_add(class_id: u32, confidence: f32, id: &str) -> DiscrepancyRecord {
        DiscrepancyRecord::new(
            class_id,
            BoundingBox::from_center(0.25, 0.25, 0.1, 0.1),
            confidence,
            0.0,
            id,
        )
    }

    fn to_remove(class_id: u32, id: &str) -> DiscrepancyRecord {
        DiscrepancyRecord::new(
            class_id,
            BoundingBox::from_center(0.5, 0.5, 0.2, 0.2),
            -1.0,
            0.0,
            id,
        )
    }

    fn reload(path: &Path) -> Ledger {
        Ledger::load(path, false, ParseMode::Strict).expect("ledger")
    }

    #[test]
    fn accept_appends_label_and_backs_up_each_file_once() {
        let fx = Fixture::new();
        fx.image("img", "0 0.5 0.5 0.2 0.2");
        let mut second = to_add(1, 0.7, "img");
        second.bbox = BoundingBox::from_center(0.75, 0.75, 0.1, 0.1);
        fx.ledger(&[to_add(1, 0.9, "img"), second]);

        let mut session = ReviewSession::open(fx.config(), Script::new(&[Verdict::Accept; 2]))
            .expect("open");
        let summary = session.run();

        assert_eq!(summary.accepted, 2);
        assert!(!summary.quit);
        assert_eq!(fx.labels("img").len(), 3);
        let ledger = reload(&fx.ledger_path());
        for record in ledger.records() {
            assert!(record.treated);
            assert_relative_eq!(record.iou, 1.0);
        }

        let backups = fx.backups();
        assert_eq!(backups.len(), 2, "{backups:?}");
        assert_eq!(backups.iter().filter(|n| *n == "img.txt").count(), 1);
        assert_eq!(
            fs::read_to_string(fx.backup_dir().join("img.txt")).expect("backup"),
            "0 0.5 0.5 0.2 0.2"
        );
    }

    #[test]
    fn first_accept_on_unlabeled_image_snapshots_empty_state() {
        let fx = Fixture::new();
        fx.unlabeled_image("img");
        let mut second = to_add(1, 0.7, "img");
        second.bbox = BoundingBox::from_center(0.75, 0.75, 0.1, 0.1);
        fx.ledger(&[to_add(1, 0.9, "img"), second]);

        let mut session = ReviewSession::open(fx.config(), Script::new(&[Verdict::Accept; 2]))
            .expect("open");
        let summary = session.run();

        assert_eq!(summary.accepted, 2);
        assert_eq!(fx.labels("img").len(), 2);
        assert_eq!(
            fs::read_to_string(fx.backup_dir().join("img.txt")).expect("backup"),
            ""
        );
        assert_eq!(fx.backups().len(), 2);
    }

    #[test]
    fn accept_keeps_boxes_past_the_border() {
        let fx = Fixture::new();
        fx.image("img", "");
        let mut record = to_add(2, 0.9, "img");
        record.bbox = BoundingBox::new(0.9, 0.9, 0.2, 0.2);
        assert!(!record.to_annotation().is_valid());
        fx.ledger(&[record]);

        let mut session =
            ReviewSession::open(fx.config(), Script::new(&[Verdict::Accept])).expect("open");
        let summary = session.run();

        assert_eq!(summary.accepted, 1);
        let labels = fx.labels("img");
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].class_id, 2);
    }

    #[test]
    fn reject_and_keep_only_touch_the_ledger() {
        let fx = Fixture::new();
        fx.image("img", "3 0.5 0.5 0.2 0.2");
        fx.ledger(&[to_add(1, 0.9, "img"), to_remove(3, "img")]);

        let mut session =
            ReviewSession::open(fx.config(), Script::new(&[Verdict::Reject, Verdict::Keep]))
                .expect("open");
        let summary = session.run();

        assert_eq!((summary.rejected, summary.kept), (1, 1));
        assert_eq!(fx.labels("img").len(), 1);
        assert!(reload(&fx.ledger_path()).records().all(|r| r.treated));
        assert!(!fx.backup_dir().join("img.txt").exists());
        assert_eq!(fx.backups().len(), 1);
    }

    #[test]
    fn delete_removes_label_and_record() {
        let fx = Fixture::new();
        fx.image("img", "3 0.5 0.5 0.2 0.2\n0 0.1 0.1 0.05 0.05");
        fx.ledger(&[to_remove(3, "img")]);

        let mut session =
            ReviewSession::open(fx.config(), Script::new(&[Verdict::Delete])).expect("open");
        let summary = session.run();

        assert_eq!(summary.deleted, 1);
        let labels = fx.labels("img");
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].class_id, 0);
        assert!(reload(&fx.ledger_path()).is_empty());
        assert!(fx.backup_dir().join("img.txt").exists());
    }

    #[test]
    fn delete_without_matching_label_leaves_record_untouched() {
        let fx = Fixture::new();
        fx.image("img", "0 0.1 0.1 0.05 0.05");
        fx.ledger(&[to_remove(3, "img")]);
        let before = fs::read_to_string(fx.ledger_path()).expect("ledger");

        let mut session =
            ReviewSession::open(fx.config(), Script::new(&[Verdict::Delete])).expect("open");
        let summary = session.run();

        assert_eq!(summary.deleted, 0);
        assert_eq!(summary.skipped, 1);
        assert_eq!(fs::read_to_string(fx.ledger_path()).expect("ledger"), before);
        assert_eq!(fx.labels("img").len(), 1);
        let record = session.ledger().get(0).expect("record");
        assert!(!record.treated);
    }

    #[test]
    fn already_labeled_candidates_are_never_shown() {
        let fx = Fixture::new();
        fx.image("img", "1 0.25 0.25 0.1 0.1");
        fx.ledger(&[to_add(1, 0.9, "img")]);

        let mut session = ReviewSession::open(fx.config(), Script::default()).expect("open");
        let summary = session.run();

        assert_eq!(summary.skipped, 1);
        assert!(session.into_presenter().seen.is_empty());
        assert!(!reload(&fx.ledger_path()).records().any(|r| r.treated));
    }

    #[test]
    fn undecodable_images_are_skipped() {
        let fx = Fixture::new();
        fs::write(fx.data().join("bad.jpg"), b"not a jpeg").expect("write");
        fs::write(fx.data().join("bad.txt"), "").expect("write");
        fx.image("good", "");
        fx.ledger(&[to_add(0, 0.9, "bad"), to_add(0, 0.5, "good")]);

        let mut session =
            ReviewSession::open(fx.config(), Script::new(&[Verdict::Reject])).expect("open");
        let summary = session.run();

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.rejected, 1);
        let ledger = reload(&fx.ledger_path());
        assert!(!ledger.get(0).expect("bad").treated);
        assert!(ledger.get(1).expect("good").treated);
    }

    #[test]
    fn pinned_class_then_fallback_to_other_queue() {
        let fx = Fixture::new();
        fx.image("img", "1 0.5 0.5 0.2 0.2");
        fx.ledger(&[to_add(0, 0.9, "img"), to_add(1, 0.8, "img"), to_remove(1, "img")]);

        let script = Script::new(&[
            Verdict::ToggleFixedClass,
            Verdict::Reject,
            Verdict::Reject,
            Verdict::Quit,
        ]);
        let mut session = ReviewSession::open(fx.config(), script).expect("open");
        let summary = session.run();

        assert!(summary.quit);
        assert_eq!(summary.rejected, 2);
        assert_eq!(session.pinned_class(), None);
        assert_eq!(
            session.into_presenter().seen,
            vec![
                (0, Category::Add),
                (0, Category::Add),
                (1, Category::Add),
                (1, Category::Remove),
            ]
        );
    }

    #[test]
    fn pinned_class_follows_into_other_category() {
        let fx = Fixture::new();
        fx.image("img", "1 0.5 0.5 0.2 0.2");
        fx.ledger(&[to_add(1, 0.9, "img"), to_add(0, 0.8, "img"), to_remove(1, "img")]);

        let script = Script::new(&[Verdict::ToggleFixedClass, Verdict::Reject]);
        let mut session = ReviewSession::open(fx.config(), script).expect("open");
        session.run();

        assert_eq!(session.pinned_class(), Some(1));
        assert_eq!(
            session.into_presenter().seen,
            vec![(1, Category::Add), (1, Category::Add), (1, Category::Remove)]
        );
    }

    #[test]
    fn toggle_category_switches_queues_without_mutation() {
        let fx = Fixture::new();
        fx.image("img", "1 0.5 0.5 0.2 0.2");
        fx.ledger(&[to_add(0, 0.9, "img"), to_remove(1, "img")]);
        let before = fs::read_to_string(fx.ledger_path()).expect("ledger");

        let script = Script::new(&[Verdict::ToggleCategory, Verdict::Quit]);
        let mut session = ReviewSession::open(fx.config(), script).expect("open");
        assert_eq!(
            session.step(),
            ReviewState::AwaitingVerdict {
                index: 0,
                category: Category::Add
            }
        );
        assert_eq!(session.step(), ReviewState::SelectingRemove);
        let summary = session.run();

        assert!(summary.quit);
        assert_eq!(fs::read_to_string(fx.ledger_path()).expect("ledger"), before);
        assert!(fx.backups().is_empty());
    }

    #[test]
    fn verdict_outside_the_alphabet_skips_the_record() {
        let fx = Fixture::new();
        fx.image("img", "");
        fx.ledger(&[to_add(0, 0.9, "img")]);

        let mut session =
            ReviewSession::open(fx.config(), Script::new(&[Verdict::Delete])).expect("open");
        let summary = session.run();

        assert_eq!(summary.skipped, 1);
        assert!(!summary.quit);
    }

    #[test]
    fn presenter_failure_ends_the_session() {
        let fx = Fixture::new();
        fx.image("img", "");
        fx.ledger(&[to_add(0, 0.9, "img")]);

        let mut session = ReviewSession::open(fx.config(), Broken).expect("open");
        let summary = session.run();

        assert_eq!(summary, ReviewSummary::default());
        assert_eq!(session.state(), ReviewState::Finished);
    }

    #[test]
    fn empty_ledger_finishes_immediately() {
        let fx = Fixture::new();
        fx.ledger(&[]);
        let mut session = ReviewSession::open(fx.config(), Script::default()).expect("open");
        assert_eq!(session.step(), ReviewState::Finished);
        assert!(session.into_presenter().seen.is_empty());
    }

    #[test]
    fn setup_errors_are_reported_before_review() {
        let fx = Fixture::new();
        assert!(matches!(
            ReviewSession::open(fx.config(), Script::default()),
            Err(ReviewError::Ledger(_))
        ));

        fx.ledger(&[]);
        let config = ReviewConfig::new(
            fx.ledger_path(),
            DatasetLayout::new(fx.dir.path().join("nope")),
        );
        assert!(matches!(
            ReviewSession::open(config, Script::default()),
            Err(ReviewError::Dataset(DatasetError::NotADirectory(_)))
        ));
    }
}
