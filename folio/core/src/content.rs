//! Static Content Store
//!
//! Read-only text the widgets render: the intro chunks, the Q&A topic graph
//! and the main question list. The built-in content is the portfolio's own
//! text; a TOML or JSON file with the same shape can replace it.
//!
//! # File Format
//!
//! ```toml
//! [[intro]]
//! text = "Enjoy your stay !"
//! html = "Enjoy your <b>stay</b> !"
//!
//! [[questions]]
//! id = "music"
//! text = "Do you like music?"
//!
//! [topics.music]
//! answer = "I love music .. what would you like to know ?"
//! followups = [
//!     { id = "music-genres", text = "Favorite genres?" },
//!     { id = "back", text = "← Back" },
//! ]
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a Q&A topic
pub type TopicId = String;

/// Errors that can occur when loading content
#[derive(Debug, Error)]
pub enum ContentError {
    /// Failed to read the content file
    #[error("Failed to read content file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML content
    #[error("Failed to parse TOML content: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Failed to parse JSON content
    #[error("Failed to parse JSON content: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Content parsed but is unusable
    #[error("Invalid content: {0}")]
    ValidationError(String),
}

/// Navigation ids that are not topics
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NavToken {
    /// Return to the previous topic
    Back,
    /// Return to the main question list
    Main,
}

impl NavToken {
    /// Accepted spellings of [`NavToken::Back`]; the first is canonical
    pub const BACK_ALIASES: [&'static str; 4] = ["back", "previous-topic", "previous", "prev"];

    /// Parse a control id
    #[must_use]
    pub fn parse(id: &str) -> Option<Self> {
        if Self::BACK_ALIASES.contains(&id) {
            Some(Self::Back)
        } else if id == "main" {
            Some(Self::Main)
        } else {
            None
        }
    }

    /// Canonical control id
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Back => Self::BACK_ALIASES[0],
            Self::Main => "main",
        }
    }
}

/// One intro typewriter chunk
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntroChunk {
    /// Plain text
    pub text: String,
    /// Markup shown once the chunk is fully typed
    pub html: String,
}

impl IntroChunk {
    /// A chunk whose markup is its plain text
    pub fn plain(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            html: text.clone(),
            text,
        }
    }
}

/// An activation target: a question, a follow-up, or a navigation control
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Followup {
    /// Topic id or navigation token
    pub id: String,
    /// Button label
    #[serde(rename = "text", alias = "label")]
    pub label: String,
}

impl Followup {
    /// Create a follow-up
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// A Q&A topic
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopicNode {
    /// Topic id
    pub id: TopicId,
    /// Answer typed onto the blackboard
    pub answer: String,
    /// Follow-up controls in display order
    pub followups: Vec<Followup>,
}

#[derive(Debug, Deserialize, Serialize)]
struct TopicEntry {
    answer: String,
    #[serde(default)]
    followups: Vec<Followup>,
}

#[derive(Debug, Deserialize, Serialize)]
struct ContentFile {
    intro: Vec<IntroChunk>,
    #[serde(default)]
    questions: Vec<Followup>,
    #[serde(default)]
    topics: BTreeMap<String, TopicEntry>,
}

/// All static content
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentStore {
    intro: Vec<IntroChunk>,
    questions: Vec<Followup>,
    topics: HashMap<TopicId, TopicNode>,
}

impl ContentStore {
    /// Build a store from parts
    #[must_use]
    pub fn new(intro: Vec<IntroChunk>, questions: Vec<Followup>, topics: Vec<TopicNode>) -> Self {
        Self {
            intro,
            questions,
            topics: topics.into_iter().map(|t| (t.id.clone(), t)).collect(),
        }
    }

    /// Load content from a TOML or JSON file (chosen by extension)
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or has no intro
    /// chunks.
    pub fn load(path: &Path) -> Result<Self, ContentError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ContentError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        let store = if is_json {
            Self::from_json_str(&raw)?
        } else {
            Self::from_toml_str(&raw)?
        };

        tracing::info!(
            path = %path.display(),
            topics = store.topics.len(),
            "Loaded content from file"
        );
        Ok(store)
    }

    /// Parse TOML content
    ///
    /// # Errors
    ///
    /// Returns an error on malformed TOML or empty intro list.
    pub fn from_toml_str(raw: &str) -> Result<Self, ContentError> {
        let file: ContentFile = toml::from_str(raw)?;
        Self::from_file(file)
    }

    /// Parse JSON content
    ///
    /// # Errors
    ///
    /// Returns an error on malformed JSON or empty intro list.
    pub fn from_json_str(raw: &str) -> Result<Self, ContentError> {
        let file: ContentFile = serde_json::from_str(raw)?;
        Self::from_file(file)
    }

    /// Serialize to TOML (the shape [`ContentStore::from_toml_str`] reads)
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        let topics = self
            .topics
            .values()
            .map(|t| {
                (
                    t.id.clone(),
                    TopicEntry {
                        answer: t.answer.clone(),
                        followups: t.followups.clone(),
                    },
                )
            })
            .collect();
        toml::to_string(&ContentFile {
            intro: self.intro.clone(),
            questions: self.questions.clone(),
            topics,
        })
    }

    fn from_file(file: ContentFile) -> Result<Self, ContentError> {
        if file.intro.is_empty() {
            return Err(ContentError::ValidationError(
                "content needs at least one intro chunk".to_string(),
            ));
        }

        let topics = file
            .topics
            .into_iter()
            .map(|(id, entry)| TopicNode {
                id,
                answer: entry.answer,
                followups: entry.followups,
            })
            .collect();
        let store = Self::new(file.intro, file.questions, topics);

        for (topic, target) in store.dangling_followups() {
            tracing::warn!(%topic, %target, "Follow-up points at a missing topic");
        }
        Ok(store)
    }

    /// The portfolio's own content
    #[must_use]
    pub fn builtin() -> Self {
        let intro = vec![
            IntroChunk {
                text: "I'm an IT student who likes cute things, music, and coffee!".to_string(),
                html: "I'm an IT student who likes cute things, music, and <span class='font-bold'>coffee!</span>".to_string(),
            },
            IntroChunk::plain(
                "This website is my attempt to recreate the peacefulness that coffee gives me in the digital world ...",
            ),
            IntroChunk::plain(
                "Consider it a place to take a breather .. from that constant motion of the internet.",
            ),
            IntroChunk::plain("Enjoy your stay !"),
        ];

        let questions = vec![
            Followup::new("education", "What are you studying?"),
            Followup::new("projects", "What are you working on?"),
            Followup::new("music", "Do you like music?"),
            Followup::new("cats-dogs", "Cats or dogs?"),
        ];

        let back = |label: &str| Followup::new(NavToken::Back.id(), label);
        let main = || Followup::new(NavToken::Main.id(), "← Main Menu");
        let topic = |id: &str, answer: &str, followups: Vec<Followup>| TopicNode {
            id: id.to_string(),
            answer: answer.to_string(),
            followups,
        };

        let topics = vec![
            topic(
                "education",
                "I'm a Master's student in IT with a focus on Computer Graphics and Human-Computer interactions. I love exploring how technology can create beautiful experiences, especially in AR settings.",
                vec![
                    Followup::new("education-uni", "Which university?"),
                    Followup::new("education-skills", "Key skills?"),
                    back("← Back"),
                ],
            ),
            topic(
                "education-uni",
                "I'm studying at Institut Polytechnique de Paris!",
                vec![back("← Back to Education"), main()],
            ),
            topic(
                "education-skills",
                "I've developed skills in Unity 3D, C++, and JavaScript. And I learned a lot about usability and design throughout my studies.",
                vec![back("← Back to Education"), main()],
            ),
            topic(
                "projects",
                "I have lots of projects .. Check them out below !",
                vec![
                    Followup::new("projects-favorite", "Favorite project?"),
                    Followup::new("projects-future", "Future plans?"),
                    back("← Back"),
                ],
            ),
            topic(
                "projects-favorite",
                "My favorite project is the AR Pathfinding system for Parkinson's patients. It was my personal research project where I got to see a real impact on patients who suffered from mobility issues. It was an example of how technology can make people's lives a bit better and it's what I would love to work on in the future.",
                vec![back("← Back to Projects"), main()],
            ),
            topic(
                "projects-future",
                "I want to explore more AR/VR applications in healthcare and education. The potential to create accessible, helpful technology really motivates me!",
                vec![back("← Back to Projects"), main()],
            ),
            topic(
                "music",
                "I love music .. what would you like to know ?",
                vec![
                    Followup::new("music-instruments", "What instruments?"),
                    Followup::new("music-genres", "Favorite genres?"),
                    back("← Back"),
                ],
            ),
            topic(
                "music-instruments",
                "I play piano, guitar, and violin!",
                vec![back("← Back to Music"), main()],
            ),
            topic(
                "music-genres",
                "I love Heavy Metal and Electro.",
                vec![back("← Back to Music"), main()],
            ),
            topic(
                "cats-dogs",
                "Definitely cats! 🐱",
                vec![
                    Followup::new("cats-dogs-why", "Why cats?"),
                    Followup::new("cats-dogs-pet", "Do you have a cat?"),
                    back("← Back"),
                ],
            ),
            topic(
                "cats-dogs-why",
                "Cats are like elegant code - efficient, independent, and sometimes unpredictable! They respect your space but show affection on their own terms.",
                vec![back("← Back to Cats or Dogs"), main()],
            ),
            topic(
                "cats-dogs-pet",
                "Sadly not, I've never had one .. But I can't wait !",
                vec![back("← Back to Cats or Dogs"), main()],
            ),
        ];

        Self::new(intro, questions, topics)
    }

    /// Intro chunks in display order
    #[must_use]
    pub fn intro_chunks(&self) -> &[IntroChunk] {
        &self.intro
    }

    /// Main question list in display order
    #[must_use]
    pub fn questions(&self) -> &[Followup] {
        &self.questions
    }

    /// Look up a topic
    #[must_use]
    pub fn topic(&self, id: &str) -> Option<&TopicNode> {
        self.topics.get(id)
    }

    /// Number of topics
    #[must_use]
    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }

    /// `(topic, follow-up id)` pairs whose follow-up resolves to nothing
    ///
    /// Navigation tokens are never dangling. Main questions are reported
    /// with an empty topic id. Sorted for stable output.
    #[must_use]
    pub fn dangling_followups(&self) -> Vec<(TopicId, String)> {
        let from_questions = self.questions.iter().map(|q| (String::new(), q));
        let from_topics = self
            .topics
            .values()
            .flat_map(|t| t.followups.iter().map(move |f| (t.id.clone(), f)));

        let mut dangling: Vec<(TopicId, String)> = from_questions
            .chain(from_topics)
            .filter(|(_, f)| NavToken::parse(&f.id).is_none() && !self.topics.contains_key(&f.id))
            .map(|(topic, f)| (topic, f.id.clone()))
            .collect();
        dangling.sort();
        dangling
    }
}

impl Default for ContentStore {
    fn default() -> Self {
        Self::builtin()
    }
}
