use std::sync::Arc;

use hub_core::merge::{BookmarkEdit, ProgressPatch, merge};
use hub_core::model::{DisciplineId, ProgressRecord, RegionName, Resource, StageId, UserId};
use hub_core::time::{fixed_clock, fixed_now};
use storage::repository::ProgressRepository;
use storage::sqlite::SqliteRepository;
use storage::{ProgressStore, StoreConfig};

async fn connect(name: &str) -> SqliteRepository {
    SqliteRepository::open(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
        .await
        .expect("open")
}

fn ids() -> (UserId, DisciplineId) {
    (
        UserId::new("learner-7").unwrap(),
        DisciplineId::new("data-science").unwrap(),
    )
}

#[tokio::test]
async fn sqlite_roundtrip_keeps_explicit_false_and_bookmarks() {
    let repo = connect("memdb_progress_roundtrip").await;
    let (user, discipline) = ids();
    let eu = RegionName::new("EU");

    let mut record = ProgressRecord::default();
    for patch in [
        ProgressPatch::checklist_item(eu.clone(), StageId::from(1), "read intro".into(), false),
        ProgressPatch::notes(eu.clone(), StageId::from(1), "pandas is neat"),
        ProgressPatch::preferred_region(eu.clone()),
        ProgressPatch::bookmark(BookmarkEdit::Include(
            Resource::new("Kaggle Learn", "course", "https://kaggle.com/learn", "Kaggle")
                .with_estimated_hours(6.0),
        )),
    ] {
        record = merge(&record, &patch);
    }

    repo.save(&user, &discipline, &record, fixed_now())
        .await
        .unwrap();
    let row = repo.load(&user, &discipline).await.unwrap().expect("row");

    assert_eq!(row.record, record);
    assert_eq!(row.updated_at, fixed_now());
    assert_eq!(row.record.task(&eu, &StageId::from(1), "read intro"), Some(false));
}

#[tokio::test]
async fn sqlite_store_merges_across_regions_without_loss() {
    let repo = connect("memdb_progress_regions").await;
    let store = ProgressStore::new(Arc::new(repo.clone()), fixed_clock(), StoreConfig::default());
    let (user, discipline) = ids();
    let global = RegionName::global();
    let apac = RegionName::new("APAC");

    assert!(repo.load(&user, &discipline).await.unwrap().is_none());
    assert_eq!(
        store.get(&user, &discipline).await.unwrap(),
        ProgressRecord::default()
    );
    assert!(repo.load(&user, &discipline).await.unwrap().is_none());

    let apac_patch =
        ProgressPatch::checklist_item(apac.clone(), StageId::from(2), "watch video".into(), true);
    let after_apac = store
        .compare_and_write(&user, &discipline, |c| merge(&c, &apac_patch))
        .await
        .unwrap();
    let apac_before = serde_json::to_string(after_apac.region(&apac).unwrap()).unwrap();

    let global_patch = ProgressPatch::notes(global.clone(), StageId::from(1), "first notes");
    let after_global = store
        .compare_and_write(&user, &discipline, |c| merge(&c, &global_patch))
        .await
        .unwrap();

    let reloaded = store.get(&user, &discipline).await.unwrap();
    assert_eq!(reloaded, after_global);
    assert_eq!(
        serde_json::to_string(reloaded.region(&apac).unwrap()).unwrap(),
        apac_before
    );
    assert_eq!(reloaded.notes(&global, &StageId::from(1)), "first notes");
}
