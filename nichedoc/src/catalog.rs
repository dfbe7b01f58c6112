//! Catalog records used by the dashboard, and the built-in catalogs that seed
//! them.
//!
//! Three collections hold the assessment catalog:
//!
//! - `skills` - [`Skill`] entries grouped by category
//! - `questions` - the numbered statements of the assessment ([`Question`])
//! - `questionnaires` - per-niche questionnaires ([`Questionnaire`])
//!
//! [`seed_skills`] and [`seed_questions`] fill an empty store from
//! [`SKILL_CATALOG`] and [`QUESTION_BANK`].

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use nichedoc_core::{
    backend::StoreBackend,
    document::Record,
    error::{DocumentStoreError, DocumentStoreResult},
    query::{DEFAULT_LIMIT, Query},
    store::DocumentStore,
    value::Value,
};

/// Longest accepted value for names, categories, titles and niches.
pub const MAX_LENGTH: usize = 255;

/// A record that failed the checks applied before it is written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("`{0}` is required")]
    Required(&'static str),
    #[error("`{field}` must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("a questionnaire needs at least one question")]
    NoQuestions,
    #[error("question {0} has no text")]
    EmptyQuestion(usize),
}

impl From<ValidationError> for DocumentStoreError {
    fn from(err: ValidationError) -> Self {
        DocumentStoreError::InvalidDocument(err.to_string())
    }
}

fn check_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required(field));
    }
    if value.chars().count() > MAX_LENGTH {
        return Err(ValidationError::TooLong { field, max: MAX_LENGTH });
    }

    Ok(())
}

/// A skill shown in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    #[serde(rename = "_id", default, skip_serializing)]
    pub id: Option<String>,
    pub name: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Skill {
    /// A new skill stamped with the current time.
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            name: name.into(),
            category: category.into(),
            description: None,
            icon: None,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_text("name", &self.name)?;
        check_text("category", &self.category)
    }
}

impl Record for Skill {
    fn collection_name() -> &'static str {
        "skills"
    }
}

/// One numbered statement of the assessment.
///
/// The number is stored in the document's `id` field; the document itself
/// gets a generated identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "_id", default, skip_serializing)]
    pub document_id: Option<String>,
    #[serde(rename = "id")]
    pub number: u32,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Question {
    pub fn new(number: u32, question: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            document_id: None,
            number,
            question: question.into(),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

impl Record for Question {
    fn collection_name() -> &'static str {
        "questions"
    }
}

/// How a questionnaire item is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice,
    Rating,
    Text,
    YesNo,
}

/// A question inside a questionnaire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionnaireItem {
    pub question: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default)]
    pub required: bool,
}

impl QuestionnaireItem {
    pub fn new(question: impl Into<String>, kind: QuestionKind) -> Self {
        Self { question: question.into(), kind, options: Vec::new(), required: false }
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A questionnaire targeted at one career niche.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Questionnaire {
    #[serde(rename = "_id", default, skip_serializing)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub niche: String,
    pub questions: Vec<QuestionnaireItem>,
    #[serde(default = "active_by_default")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn active_by_default() -> bool {
    true
}

impl Questionnaire {
    /// A new, active questionnaire stamped with the current time.
    pub fn new(title: impl Into<String>, niche: impl Into<String>, questions: Vec<QuestionnaireItem>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            title: title.into(),
            description: None,
            niche: niche.into(),
            questions,
            active: true,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_text("title", &self.title)?;
        check_text("niche", &self.niche)?;

        if self.questions.is_empty() {
            return Err(ValidationError::NoQuestions);
        }
        if let Some(index) = self.questions.iter().position(|item| item.question.trim().is_empty()) {
            return Err(ValidationError::EmptyQuestion(index + 1));
        }

        Ok(())
    }
}

impl Record for Questionnaire {
    fn collection_name() -> &'static str {
        "questionnaires"
    }
}

/// A category of the built-in skill catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkillCategory {
    pub icon: &'static str,
    pub name: &'static str,
    pub skills: &'static [&'static str],
}

impl SkillCategory {
    /// The category as displayed, icon first.
    pub fn label(&self) -> String {
        format!("{} {}", self.icon, self.name)
    }
}

/// The skill catalog the dashboard starts from.
pub const SKILL_CATALOG: &[SkillCategory] = &[
    SkillCategory {
        icon: "💻",
        name: "Core Technical Skills",
        skills: &[
            "Computer Hardware & Troubleshooting",
            "Operating Systems (Windows, macOS, Linux)",
            "Networking Fundamentals",
            "System Administration",
            "IT Support / Helpdesk",
            "Cloud Computing (AWS, Azure, Google Cloud)",
            "Virtualization (VMware, Hyper-V)",
            "Cybersecurity Basics",
            "Database Management (SQL, MySQL, Oracle)",
            "Scripting (Bash, PowerShell)",
        ],
    },
    SkillCategory {
        icon: "🧑‍💻",
        name: "Programming & Development",
        skills: &[
            "HTML / CSS / JavaScript",
            "Python",
            "Java",
            "C / C++ / C#",
            "PHP",
            "Go (Golang)",
            "Kotlin / Swift (Mobile Development)",
            "TypeScript",
            "API Integration",
            "Software Testing (Unit, Integration, Automation)",
        ],
    },
    SkillCategory {
        icon: "☁️",
        name: "Cloud & DevOps",
        skills: &[
            "CI/CD Pipelines",
            "Docker / Kubernetes",
            "Infrastructure as Code (Terraform, Ansible)",
            "Git / Version Control",
            "Monitoring Tools (Prometheus, Grafana)",
            "Cloud Security",
            "Serverless Computing",
            "Load Balancing & Scaling",
        ],
    },
    SkillCategory {
        icon: "🧠",
        name: "Data & Analytics",
        skills: &[
            "Data Analysis",
            "Data Visualization (Tableau, Power BI)",
            "Machine Learning / AI Basics",
            "Data Engineering",
            "Data Warehousing",
            "Statistics & Probability",
            "Big Data Tools (Hadoop, Spark)",
            "Database Query Optimization",
        ],
    },
    SkillCategory {
        icon: "🔒",
        name: "Cybersecurity",
        skills: &[
            "Network Security",
            "Ethical Hacking / Penetration Testing",
            "Vulnerability Assessment",
            "Firewalls & VPNs",
            "Incident Response",
            "Security Auditing & Compliance",
            "Encryption & Cryptography",
            "Security Information and Event Management (SIEM)",
        ],
    },
    SkillCategory {
        icon: "🎨",
        name: "UI/UX & Design",
        skills: &[
            "UI/UX Principles",
            "Wireframing & Prototyping (Figma, Adobe XD)",
            "Responsive Web Design",
            "Accessibility Standards",
            "Graphic Design (Photoshop, Illustrator)",
            "Design Systems & Component Libraries",
        ],
    },
    SkillCategory {
        icon: "🧩",
        name: "Project & Business IT Skills",
        skills: &[
            "Agile / Scrum / Kanban",
            "IT Project Management",
            "Business Analysis",
            "Technical Documentation",
            "ITIL Framework",
            "Quality Assurance (QA)",
            "Product Management",
        ],
    },
    SkillCategory {
        icon: "🤖",
        name: "Emerging Tech",
        skills: &[
            "Artificial Intelligence (AI)",
            "Internet of Things (IoT)",
            "Blockchain",
            "Augmented Reality (AR) / Virtual Reality (VR)",
            "Quantum Computing",
            "Edge Computing",
        ],
    },
];

/// The numbered assessment statements. Empty entries are retired numbers.
pub const QUESTION_BANK: &[(u32, &str)] = &[
    (1, "I enjoy breaking down complex problems into logical steps"),
    (2, "I prefer making decisions based on data and evidence rather than intuition"),
    (3, "I enjoy thinking outside the box and exploring innovative solutions"),
    (4, "I prefer projects that allow me to express my creative ideas and originality"),
    (5, "I enjoy understanding user needs and creating solutions that help people"),
    (6, "I prioritize making technology accessible and user-friendly for everyone"),
    (7, "I enjoy exploring new technologies and learning how they work"),
    (8, "I'm always asking 'why' and seeking deeper understanding of systems"),
    (9, "I take ownership of projects and ensure they're completed thoroughly"),
    (10, "I prefer reliable, well-tested solutions over quick experimental ones"),
    (11, "I enjoy thinking about the long-term impact and future possibilities of technology"),
    (12, "I prefer strategic planning and thinking about how to transform systems"),
    (13, ""),
    (14, "I prefer working in teams and collaborating with others on projects"),
    (15, "I work best independently and prefer focusing deeply on my own tasks"),
    (16, "I enjoy focusing on specific details and ensuring everything is perfect"),
    (17, "I prefer seeing the big picture and understanding overall system architecture"),
    (18, "I enjoy following established processes and best practices"),
    (19, "I prefer focusing on delivering results quickly rather than following strict processes"),
    (20, "I work best with clear structure, deadlines, and defined milestones"),
    (21, "I prefer flexible schedules and adapting my approach as projects evolve"),
    (22, ""),
    (23, "I'm most interested in working with healthcare and medical technology"),
    (24, "I'm most interested in working with financial technology and banking systems"),
    (25, "I'm most interested in working with education and learning platforms"),
    (26, "I'm most interested in working with logistics and supply chain technology"),
    (27, "I'm most interested in working with e-commerce and retail technology"),
    (28, "I'm most interested in working across multiple industries"),
    (29, "I'm passionate about solving cybersecurity and data protection challenges"),
    (30, "I enjoy optimizing systems for better performance and efficiency"),
    (31, "I focus on creating intuitive and delightful user experiences"),
    (32, "I love automating repetitive processes to save time and resources"),
    (33, "I work on data analysis and helping organizations make data-driven decisions"),
    (34, "I focus on building scalable systems that grow with businesses"),
    (35, "I want to help development teams work more efficiently"),
    (36, "I want to create solutions that directly benefit end-users"),
    (37, "I want to help businesses solve strategic technology challenges"),
    (38, "I want to work with specific industries to solve domain-specific problems"),
    (39, ""),
    (40, "Do you enjoy editing videos or creating multimedia content?"),
    (41, "Are you interested in graphic design or digital art creation?"),
    (42, "Do you enjoy coding or programming?"),
    (43, "Are you interested in building websites or mobile applications?"),
    (44, "Do you find data visualization and reporting interesting?"),
    (45, "Are you curious about machine learning or artificial intelligence?"),
    (46, "Do you enjoy game development or interactive media design?"),
    (47, "Are you interested in virtual reality or augmented reality technologies?"),
    (48, "Are you interested in cybersecurity and ethical hacking?"),
    (49, "Do you enjoy protecting systems and preventing security threats?"),
    (50, "Are you interested in cloud computing and infrastructure management?"),
    (51, "Do you enjoy automating processes and workflow optimization?"),
];

/// Every catalog skill, stamped with `now`.
pub fn catalog_skills(now: DateTime<Utc>) -> impl Iterator<Item = Skill> {
    SKILL_CATALOG.iter().flat_map(move |category| {
        category.skills.iter().map(move |name| Skill {
            id: None,
            name: (*name).to_string(),
            category: category.name.to_string(),
            description: Some(String::new()),
            icon: Some(category.icon.to_string()),
            created_at: Some(now),
            updated_at: Some(now),
        })
    })
}

/// Every non-blank question of the bank, stamped with `now`.
pub fn bank_questions(now: DateTime<Utc>) -> impl Iterator<Item = Question> {
    QUESTION_BANK
        .iter()
        .filter(|(_, text)| !text.is_empty())
        .map(move |(number, text)| Question {
            document_id: None,
            number: *number,
            question: (*text).to_string(),
            created_at: Some(now),
            updated_at: Some(now),
        })
}

/// Outcome of a seeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub created: usize,
    pub failed: usize,
    pub cleared: usize,
}

/// Writes the skill catalog, one document per skill.
///
/// With `clear`, the skills returned by one default-sized page are deleted
/// first. Individual failures are counted and logged, never fatal.
pub async fn seed_skills<B: StoreBackend>(store: &DocumentStore<B>, clear: bool) -> SeedReport {
    let mut report = SeedReport::default();

    if clear {
        let existing = store.read_all_default(Skill::collection_name()).await;
        for skill in &existing {
            if store.delete(Skill::collection_name(), skill.id()).await {
                report.cleared += 1;
            }
        }
        tracing::info!(cleared = report.cleared, "Cleared existing skills");
    }

    let skills = store.typed_collection::<Skill>();
    for skill in catalog_skills(Utc::now()) {
        match skills.insert(&skill, None).await {
            Ok(_) => {
                report.created += 1;
                tracing::debug!(skill = %skill.name, category = %skill.category, "Added skill");
            }
            Err(err) => {
                report.failed += 1;
                tracing::warn!(skill = %skill.name, error = %err, "Failed to add skill");
            }
        }
    }

    tracing::info!(created = report.created, failed = report.failed, "Seeded skills");
    report
}

/// Writes every non-blank question of [`QUESTION_BANK`].
pub async fn seed_questions<B: StoreBackend>(store: &DocumentStore<B>) -> SeedReport {
    let mut report = SeedReport::default();

    let questions = store.typed_collection::<Question>();
    for question in bank_questions(Utc::now()) {
        match questions.insert(&question, None).await {
            Ok(_) => report.created += 1,
            Err(err) => {
                report.failed += 1;
                tracing::warn!(number = question.number, error = %err, "Failed to add question");
            }
        }
    }

    tracing::info!(created = report.created, failed = report.failed, "Seeded questions");
    report
}

/// Skills whose category is exactly `category`.
pub async fn skills_by_category<B: StoreBackend>(
    store: &DocumentStore<B>,
    category: &str,
) -> DocumentStoreResult<Vec<Skill>> {
    store
        .typed_collection::<Skill>()
        .query(Query::where_equals([("category", Value::from(category))]))
        .await
}

/// Distinct categories among the first page of skills, sorted.
pub async fn skill_categories<B: StoreBackend>(store: &DocumentStore<B>) -> DocumentStoreResult<Vec<String>> {
    let documents = store.try_read_all(Skill::collection_name(), DEFAULT_LIMIT).await?;

    let categories = documents
        .iter()
        .filter_map(|document| document.get_str("category"))
        .map(str::to_string)
        .collect::<BTreeSet<_>>();

    Ok(categories.into_iter().collect())
}

pub async fn active_questionnaires<B: StoreBackend>(
    store: &DocumentStore<B>,
) -> DocumentStoreResult<Vec<Questionnaire>> {
    store
        .typed_collection::<Questionnaire>()
        .query(Query::where_equals([("active", Value::from(true))]))
        .await
}

/// Active questionnaires for one niche.
pub async fn questionnaires_by_niche<B: StoreBackend>(
    store: &DocumentStore<B>,
    niche: &str,
) -> DocumentStoreResult<Vec<Questionnaire>> {
    store
        .typed_collection::<Questionnaire>()
        .query(Query::where_equals([
            ("niche", Value::from(niche)),
            ("active", Value::from(true)),
        ]))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use nichedoc_core::{document::RecordExt, fields};

    #[test]
    fn catalog_counts() {
        let total: usize = SKILL_CATALOG.iter().map(|category| category.skills.len()).sum();
        assert_eq!(SKILL_CATALOG.len(), 8);
        assert_eq!(total, 63);
        assert_eq!(bank_questions(Utc::now()).count(), 48);
    }

    #[test]
    fn category_labels_put_the_icon_first() {
        assert_eq!(SKILL_CATALOG[2].label(), "☁️ Cloud & DevOps");
    }

    #[test]
    fn skill_validation() {
        assert!(Skill::new("Python", "Programming").validate().is_ok());
        assert_eq!(Skill::new(" ", "Programming").validate(), Err(ValidationError::Required("name")));
        assert_eq!(
            Skill::new("Python", "x".repeat(256)).validate(),
            Err(ValidationError::TooLong { field: "category", max: MAX_LENGTH })
        );
        assert!(Skill::new("é".repeat(255), "Programming").validate().is_ok());
    }

    #[test]
    fn questionnaire_validation() {
        let item = QuestionnaireItem::new("Do you like Rust?", QuestionKind::YesNo);
        assert!(Questionnaire::new("Backend", "Software", vec![item.clone()]).validate().is_ok());
        assert_eq!(
            Questionnaire::new("Backend", "", vec![item.clone()]).validate(),
            Err(ValidationError::Required("niche"))
        );
        assert_eq!(
            Questionnaire::new("Backend", "Software", vec![]).validate(),
            Err(ValidationError::NoQuestions)
        );
        assert_eq!(
            Questionnaire::new("Backend", "Software", vec![item, QuestionnaireItem::new("", QuestionKind::Text)])
                .validate(),
            Err(ValidationError::EmptyQuestion(2))
        );
    }

    #[test]
    fn question_number_is_stored_as_id() {
        let fields = Question::new(7, "I enjoy exploring new technologies").to_fields().unwrap();
        assert_eq!(fields.get("id"), Some(&Value::Integer(7)));
        assert!(!fields.contains_key("_id"));
    }

    #[test]
    fn questionnaire_items_use_snake_case_kinds() {
        let questionnaire = Questionnaire::new(
            "Data",
            "Analytics",
            vec![QuestionnaireItem::new("Favourite tool?", QuestionKind::MultipleChoice).with_options(["SQL", "Spark"])],
        );
        let fields = questionnaire.to_fields().unwrap();

        let items = fields.get("questions").and_then(Value::as_array).unwrap();
        let item = items[0].as_map().unwrap();
        assert_eq!(item.get("type"), Some(&Value::from("multiple_choice")));
        assert_eq!(item.get("options"), Some(&Value::from(vec!["SQL", "Spark"])));
        assert_eq!(fields.get("active"), Some(&Value::Boolean(true)));
    }

    #[test]
    fn missing_active_flag_reads_as_active() {
        let document = nichedoc_core::document::Document::new(
            "q1",
            fields! {
                "title" => "Design",
                "niche" => "UX",
                "questions" => Value::Array(vec![]),
            },
        );
        let questionnaire = Questionnaire::from_document(document).unwrap();
        assert!(questionnaire.active);
        assert_eq!(questionnaire.id.as_deref(), Some("q1"));
    }
}
