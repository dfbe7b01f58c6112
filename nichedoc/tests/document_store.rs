//! Store-level scenarios run against the in-memory backend.

use nichedoc::{
    catalog::{self, QuestionKind, Questionnaire, QuestionnaireItem, SKILL_CATALOG, Skill},
    memory::InMemoryStore,
    page::{PaginationParams, filter_contains},
    prelude::*,
};

async fn five_item_fixture() -> InMemoryStore {
    InMemoryStore::builder()
        .with_document("items", "d1", fields! { "a" => 1, "b" => "x" })
        .with_document("items", "d2", fields! { "a" => 1, "b" => "y" })
        .with_document("items", "d3", fields! { "a" => 2, "b" => "x" })
        .with_document("items", "d4", fields! { "a" => 1, "b" => "x" })
        .with_document("items", "d5", fields! { "b" => "x" })
        .build()
        .await
        .unwrap()
}

#[tokio::test]
async fn created_skill_reads_back() {
    let store = DocumentStore::new(InMemoryStore::new());

    let created = store
        .create("skills", fields! { "name" => "Python", "category" => "Programming" }, None)
        .await
        .unwrap();

    let read = store.read("skills", created.id()).await.unwrap();
    assert_eq!(read.get_str("name"), Some("Python"));
    assert_eq!(read.id(), created.id());
}

#[tokio::test]
async fn update_only_touches_the_given_fields() {
    let store = DocumentStore::new(InMemoryStore::new());
    let created = store
        .create("skills", fields! { "name" => "Python", "category" => "Programming" }, None)
        .await
        .unwrap();

    assert!(store.update("skills", created.id(), fields! { "description" => "new" }).await);

    let read = store.read("skills", created.id()).await.unwrap();
    assert_eq!(read.get_str("name"), Some("Python"));
    assert_eq!(read.get_str("category"), Some("Programming"));
    assert_eq!(read.get_str("description"), Some("new"));
}

#[tokio::test]
async fn update_of_missing_document_reports_failure() {
    let store = DocumentStore::new(InMemoryStore::new());

    assert!(!store.update("skills", "ghost", fields! { "name" => "x" }).await);
    assert!(store.read("skills", "ghost").await.is_none());
}

#[tokio::test]
async fn equality_query_returns_exact_matches() {
    let store = DocumentStore::new(five_item_fixture().await);

    let found = store
        .query("items", [("a", Value::from(1)), ("b", Value::from("x"))], 100)
        .await;

    let ids = found.iter().map(Document::id).collect::<Vec<_>>();
    assert_eq!(ids, vec!["d1", "d4"]);
}

#[tokio::test]
async fn query_without_conditions_matches_read_all() {
    let store = DocumentStore::new(five_item_fixture().await);

    for limit in [0, 2, 5, 100] {
        let listed = store.read_all("items", limit).await;
        let queried = store.query("items", Vec::<(String, Value)>::new(), limit).await;
        assert_eq!(listed, queried);
        assert!(listed.len() <= limit);
    }
}

#[tokio::test]
async fn invalid_names_fail_softly() {
    let store = DocumentStore::new(InMemoryStore::new());

    assert!(store.read("", "x").await.is_none());
    assert!(store.read_all("a/b", 10).await.is_empty());
    assert!(store.create("skills", fields! { "name" => "x" }, Some("a/b")).await.is_none());
    assert!(!store.delete("skills", "").await);
    assert!(matches!(
        store.try_read("skills", "a/b").await,
        Err(DocumentStoreError::InvalidDocument(_))
    ));
}

#[tokio::test]
async fn dynamic_store_downcasts_to_its_backend() {
    let store = DocumentStore::new(five_item_fixture().await).into_dyn();

    assert_eq!(store.read_all("items", 10).await.len(), 5);
    let memory = store.downcast_backend::<InMemoryStore>().unwrap();
    assert_eq!(memory.count("items").await, 5);

    store.shutdown().await.unwrap();
}

#[tokio::test]
async fn seeded_catalog_answers_dashboard_lookups() {
    let store = DocumentStore::new(InMemoryStore::new());

    let report = catalog::seed_skills(&store, false).await;
    assert_eq!(report.created, 63);
    assert_eq!(report.failed, 0);

    let cloud = catalog::skills_by_category(&store, "Cloud & DevOps").await.unwrap();
    assert_eq!(cloud.len(), 8);
    assert!(cloud.iter().all(|skill| skill.icon.as_deref() == Some("☁️")));
    assert!(cloud.iter().all(|skill| skill.id.is_some()));

    let categories = catalog::skill_categories(&store).await.unwrap();
    let mut expected = SKILL_CATALOG.iter().map(|category| category.name.to_string()).collect::<Vec<_>>();
    expected.sort();
    assert_eq!(categories, expected);
}

#[tokio::test]
async fn clearing_before_seeding_replaces_the_catalog() {
    let store = DocumentStore::new(InMemoryStore::new());
    store
        .typed_collection::<Skill>()
        .insert(&Skill::new("COBOL", "Legacy"), Some("legacy"))
        .await
        .unwrap();

    let report = catalog::seed_skills(&store, true).await;

    assert_eq!(report.cleared, 1);
    assert!(store.read("skills", "legacy").await.is_none());
    assert_eq!(store.backend().count("skills").await, 63);
}

#[tokio::test]
async fn question_bank_skips_blank_numbers() {
    let store = DocumentStore::new(InMemoryStore::new());

    let report = catalog::seed_questions(&store).await;
    assert_eq!(report.created, 48);

    let thirteen = store.query("questions", [("id", Value::from(13))], 10).await;
    assert!(thirteen.is_empty());
    let fourteen = store.query("questions", [("id", Value::from(14))], 10).await;
    assert_eq!(fourteen.len(), 1);
}

#[tokio::test]
async fn questionnaires_filter_by_niche_and_activity() {
    let store = DocumentStore::new(InMemoryStore::new());
    let questionnaires = store.typed_collection::<Questionnaire>();
    let item = QuestionnaireItem::new("Rate your SQL", QuestionKind::Rating).required();

    let mut retired = Questionnaire::new("Old data", "Data", vec![item.clone()]);
    retired.active = false;
    for questionnaire in [
        Questionnaire::new("Data basics", "Data", vec![item.clone()]),
        Questionnaire::new("Design basics", "Design", vec![item]),
        retired,
    ] {
        questionnaire.validate().unwrap();
        questionnaires.insert(&questionnaire, None).await.unwrap();
    }

    let active = catalog::active_questionnaires(&store).await.unwrap();
    assert_eq!(active.len(), 2);

    let data = catalog::questionnaires_by_niche(&store, "Data").await.unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0].title, "Data basics");
    assert_eq!(data[0].questions[0].kind, QuestionKind::Rating);
    assert!(data[0].questions[0].required);
}

#[tokio::test]
async fn listing_pages_and_search() {
    let store = DocumentStore::new(InMemoryStore::new());
    catalog::seed_skills(&store, false).await;

    let skills = store.read_all("skills", 100).await;
    let matches = filter_contains(skills, &["name", "category"], "SECURITY");
    assert_eq!(matches.len(), 10);

    let page = PaginationParams::new(2, 5).paginate(matches);
    assert_eq!(page.page, 2);
    assert_eq!(page.items.len(), 5);
    assert_eq!(page.previous_page, Some(1));
}
