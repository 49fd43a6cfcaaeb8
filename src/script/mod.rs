//! Step files and the sequences they describe.
//!
//! A step file is a property file:
//!
//! ```text
//! title        = Meet the Moai
//! step.0.text  = Hi
//! step.0.audio = a.mp3
//! step.0.character = moai.png
//! step.1.text  = Bye
//! step.1.audio = b.mp3
//! ```

pub mod assets;
pub mod propfile;

pub use assets::{AssetError, AssetResolver, DirResolver};
pub use propfile::{parse_propfile, PropertyError, PropertyFile};

use std::collections::BTreeMap;
use std::path::Path;

use thiserror::Error;

const STEP_PREFIX: &str = "step.";
const TEXT_FIELD: &str = "text";
const AUDIO_FIELD: &str = "audio";
const TITLE_KEY: &str = "title";

/// Errors raised while building a sequence
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("sequence has no steps")]
    Empty,
    #[error("step {index} is missing field '{field}'")]
    MissingField { index: usize, field: &'static str },
    #[error("step indices are not contiguous: step {0} is missing")]
    MissingStep(usize),
    #[error("malformed step key '{0}'")]
    MalformedKey(String),
    #[error(transparent)]
    Io(#[from] PropertyError),
}

/// One unit of narrated content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    text: String,
    audio_ref: String,
    fields: BTreeMap<String, String>,
}

impl Step {
    pub fn new(text: impl Into<String>, audio_ref: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            audio_ref: audio_ref.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Attach a display field (character image, background, concept text...)
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn audio_ref(&self) -> &str {
        &self.audio_ref
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Length of the text in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Ordered, non-empty list of steps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    title: Option<String>,
    steps: Vec<Step>,
}

#[derive(Default)]
struct StepBuilder {
    text: Option<String>,
    audio: Option<String>,
    fields: BTreeMap<String, String>,
}

impl Sequence {
    pub fn new(steps: Vec<Step>) -> Result<Self, ScriptError> {
        if steps.is_empty() {
            return Err(ScriptError::Empty);
        }
        Ok(Self { title: None, steps })
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Build a sequence from parsed step-file properties
    pub fn from_properties(props: &PropertyFile) -> Result<Self, ScriptError> {
        let mut title = None;
        let mut builders: BTreeMap<usize, StepBuilder> = BTreeMap::new();

        for (key, value) in props.iter() {
            if key == TITLE_KEY {
                title = Some(value.to_string());
                continue;
            }
            let Some(rest) = key.strip_prefix(STEP_PREFIX) else {
                log::debug!("ignoring unknown key '{}'", key);
                continue;
            };
            let (index, field) = rest
                .split_once('.')
                .and_then(|(idx, field)| Some((parse_step_index(idx)?, field)))
                .filter(|(_, field)| !field.is_empty())
                .ok_or_else(|| ScriptError::MalformedKey(key.to_string()))?;

            let builder = builders.entry(index).or_default();
            match field {
                TEXT_FIELD => builder.text = Some(value.to_string()),
                AUDIO_FIELD => builder.audio = Some(value.to_string()),
                other => {
                    builder.fields.insert(other.to_string(), value.to_string());
                }
            }
        }

        let mut steps = Vec::with_capacity(builders.len());
        for (expected, (index, builder)) in builders.into_iter().enumerate() {
            if index != expected {
                return Err(ScriptError::MissingStep(expected));
            }
            let text = builder.text.ok_or(ScriptError::MissingField {
                index,
                field: TEXT_FIELD,
            })?;
            let audio = builder.audio.ok_or(ScriptError::MissingField {
                index,
                field: AUDIO_FIELD,
            })?;
            let mut step = Step::new(text, audio);
            step.fields = builder.fields;
            steps.push(step);
        }

        let mut sequence = Self::new(steps)?;
        sequence.title = title;
        Ok(sequence)
    }

    pub fn parse(content: &str) -> Result<Self, ScriptError> {
        Self::from_properties(&PropertyFile::parse(content))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScriptError> {
        let props = PropertyFile::load(path)?;
        Self::from_properties(&props)
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Never true for a constructed sequence
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn last_index(&self) -> usize {
        self.steps.len() - 1
    }
}

/// Plain decimal index; `01` or `+1` would alias another step
fn parse_step_index(idx: &str) -> Option<usize> {
    let digits = idx.bytes().all(|b| b.is_ascii_digit());
    let canonical = idx == "0" || (digits && !idx.starts_with('0'));
    if canonical {
        idx.parse().ok()
    } else {
        None
    }
}
