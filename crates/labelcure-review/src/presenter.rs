//! Verdict sources: anything that shows a candidate and returns a decision.

use std::{
    fmt,
    io::{BufRead, Write},
};

use image::{DynamicImage, GenericImageView};
use labelcure_core::{Category, DiscrepancyRecord};

use crate::error::PresenterError;

/// Decision on one candidate record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Add the predicted object to the annotations.
    Accept,
    /// Leave the annotations alone, mark the record treated.
    Reject,
    /// Remove the annotation the record points at.
    Delete,
    /// Keep the annotation, mark the record treated.
    Keep,
    Quit,
    /// Switch between the add and remove queues.
    ToggleCategory,
    /// Restrict selection to the class of the current record (or lift it).
    ToggleFixedClass,
}

const ADD_VERDICTS: [Verdict; 5] = [
    Verdict::Accept,
    Verdict::Reject,
    Verdict::Quit,
    Verdict::ToggleCategory,
    Verdict::ToggleFixedClass,
];

const REMOVE_VERDICTS: [Verdict; 5] = [
    Verdict::Delete,
    Verdict::Keep,
    Verdict::Quit,
    Verdict::ToggleCategory,
    Verdict::ToggleFixedClass,
];

impl Verdict {
    /// Verdicts that make sense for a record of `category`.
    pub fn allowed_for(category: Category) -> &'static [Verdict] {
        match category {
            Category::Add => &ADD_VERDICTS,
            Category::Remove => &REMOVE_VERDICTS,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Verdict::Accept => "accept",
            Verdict::Reject => "reject",
            Verdict::Delete => "delete",
            Verdict::Keep => "keep",
            Verdict::Quit => "quit",
            Verdict::ToggleCategory => "switch add/remove",
            Verdict::ToggleFixedClass => "fix/unfix class",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Everything a presenter gets to show for one candidate.
#[derive(Clone, Copy, Debug)]
pub struct ReviewView<'a> {
    pub image: &'a DynamicImage,
    pub record: &'a DiscrepancyRecord,
    pub category: Category,
    /// Human readable description of the candidate.
    pub overlay: &'a str,
    /// Verdicts the session will act on.
    pub allowed: &'a [Verdict],
}

/// Shows a candidate and blocks until a verdict is available.
///
/// Returning an error ends the review session; committed changes stay.
pub trait Presenter {
    fn present(&mut self, view: &ReviewView<'_>) -> Result<Verdict, PresenterError>;
}

impl<P: Presenter + ?Sized> Presenter for &mut P {
    fn present(&mut self, view: &ReviewView<'_>) -> Result<Verdict, PresenterError> {
        (**self).present(view)
    }
}

/// Keyboard characters mapped to verdicts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyBindings {
    pub accept: char,
    pub reject: char,
    pub delete: char,
    pub keep: char,
    pub quit: char,
    pub toggle_category: char,
    pub toggle_fixed_class: char,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            accept: 'y',
            reject: 'n',
            delete: 'd',
            keep: 'k',
            quit: 'q',
            toggle_category: 't',
            toggle_fixed_class: 'f',
        }
    }
}

impl KeyBindings {
    pub fn key(&self, verdict: Verdict) -> char {
        match verdict {
            Verdict::Accept => self.accept,
            Verdict::Reject => self.reject,
            Verdict::Delete => self.delete,
            Verdict::Keep => self.keep,
            Verdict::Quit => self.quit,
            Verdict::ToggleCategory => self.toggle_category,
            Verdict::ToggleFixedClass => self.toggle_fixed_class,
        }
    }

    /// First verdict in `allowed` bound to `key`.
    pub fn verdict(&self, key: char, allowed: &[Verdict]) -> Option<Verdict> {
        allowed.iter().copied().find(|v| self.key(*v) == key)
    }

    /// One-line key help for `allowed`.
    pub fn help(&self, allowed: &[Verdict]) -> String {
        allowed
            .iter()
            .map(|v| format!("[{}] {}", self.key(*v), v.label()))
            .collect::<Vec<_>>()
            .join("  ")
    }
}

/// Line-oriented presenter for terminals and pipes.
///
/// Reads one line per decision and uses its first character. End of input
/// means quit.
pub struct TerminalPresenter<R, W> {
    input: R,
    output: W,
    keys: KeyBindings,
}

impl<R: BufRead, W: Write> TerminalPresenter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self::with_keys(input, output, KeyBindings::default())
    }

    pub fn with_keys(input: R, output: W, keys: KeyBindings) -> Self {
        Self {
            input,
            output,
            keys,
        }
    }

    pub fn keys(&self) -> &KeyBindings {
        &self.keys
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }
}

impl<R: BufRead, W: Write> Presenter for TerminalPresenter<R, W> {
    fn present(&mut self, view: &ReviewView<'_>) -> Result<Verdict, PresenterError> {
        let (width, height) = view.image.dimensions();
        writeln!(self.output)?;
        writeln!(self.output, "{}", view.overlay)?;
        writeln!(
            self.output,
            "image {} ({width}x{height}), box {}",
            view.record.image_id, view.record.bbox
        )?;
        let help = self.keys.help(view.allowed);

        let mut line = String::new();
        loop {
            write!(self.output, "{help}\n> ")?;
            self.output.flush()?;

            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(Verdict::Quit);
            }
            let Some(key) = line.trim().chars().next() else {
                continue;
            };
            match self.keys.verdict(key, view.allowed) {
                Some(verdict) => return Ok(verdict),
                None => writeln!(self.output, "'{key}' is not a valid choice here")?,
            }
        }
    }
}
