//! 仓库与搜索的性质测试

use hospital_core::{Record, RecordId, Value};
use hospital_records::{search, IdStrategy, Repository};
use proptest::prelude::*;

fn record(seq: usize, name: &str) -> Record {
    Record::new(RecordId::sequential('P', seq)).with("name", Value::Text(name.to_string()))
}

fn repository(names: &[String]) -> Repository {
    let records = names
        .iter()
        .enumerate()
        .map(|(i, name)| record(i + 1, name))
        .collect();
    Repository::with_records(IdStrategy::Sequential, records).unwrap()
}

fn ids(repo: &Repository) -> Vec<String> {
    repo.list().iter().map(|r| r.id.to_string()).collect()
}

proptest! {
    #[test]
    fn insert_adds_exactly_one(names in prop::collection::vec("[a-z]{1,8}", 0..20), extra in "[a-z]{1,8}") {
        let mut repo = repository(&names);
        let before = repo.len();
        let id = RecordId::sequential('Q', 1);

        repo.insert(Record::new(id.clone()).with("name", Value::Text(extra))).unwrap();

        prop_assert_eq!(repo.len(), before + 1);
        prop_assert_eq!(repo.list().iter().filter(|r| r.id == id).count(), 1);
        prop_assert!(repo.insert(Record::new(id)).is_err());
    }

    #[test]
    fn replace_only_touches_target(names in prop::collection::vec("[a-z]{1,8}", 1..20), pick in any::<prop::sample::Index>()) {
        let mut repo = repository(&names);
        let before = repo.list().to_vec();
        let target = pick.index(before.len());
        let id = before[target].id.clone();

        repo.replace(&id, Record::new(id.clone()).with("name", Value::Text("changed".to_string()))).unwrap();

        let after = repo.list();
        prop_assert_eq!(after.len(), before.len());
        for (i, (old, new)) in before.iter().zip(after).enumerate() {
            prop_assert_eq!(&old.id, &new.id);
            if i == target {
                prop_assert_eq!(new.str_field("name"), Some("changed"));
            } else {
                prop_assert_eq!(old, new);
            }
        }
    }

    #[test]
    fn delete_removes_exactly_target(names in prop::collection::vec("[a-z]{1,8}", 1..20), pick in any::<prop::sample::Index>()) {
        let mut repo = repository(&names);
        let mut expected = ids(&repo);
        let target = pick.index(expected.len());
        let removed = expected.remove(target);

        repo.delete(&RecordId::new(removed.as_str())).unwrap();

        prop_assert_eq!(ids(&repo), expected);
        prop_assert_eq!(repo.next_id('P'), RecordId::sequential('P', names.len()));
    }

    #[test]
    fn monotonic_never_reuses(names in prop::collection::vec("[a-z]{1,8}", 1..20), deletes in prop::collection::vec(any::<prop::sample::Index>(), 0..10)) {
        let records = names.iter().enumerate().map(|(i, n)| record(i + 1, n)).collect();
        let mut repo = Repository::with_records(IdStrategy::Monotonic, records).unwrap();
        let mut seen: Vec<RecordId> = repo.list().iter().map(|r| r.id.clone()).collect();

        for pick in deletes {
            if repo.is_empty() {
                break;
            }
            let id = repo.list()[pick.index(repo.len())].id.clone();
            repo.delete(&id).unwrap();

            let next = repo.next_id('P');
            prop_assert!(!seen.contains(&next));
            repo.insert(Record::new(next.clone())).unwrap();
            seen.push(next);
        }
    }

    #[test]
    fn empty_search_returns_everything(names in prop::collection::vec("[a-zA-Z ]{0,8}", 0..20), blank in "[ \t]{0,4}") {
        let repo = repository(&names);
        let found = search(repo.list(), &blank, &["name"]);
        let found: Vec<&RecordId> = found.iter().map(|r| &r.id).collect();
        let all: Vec<&RecordId> = repo.list().iter().map(|r| &r.id).collect();
        prop_assert_eq!(found, all);
    }

    #[test]
    fn search_ignores_case(names in prop::collection::vec("[a-zA-Z]{1,8}", 1..20), term in "[a-zA-Z]{1,3}") {
        let repo = repository(&names);
        let lower = search(repo.list(), &term.to_lowercase(), &["name"]);
        let upper = search(repo.list(), &term.to_uppercase(), &["name"]);
        prop_assert_eq!(lower.len(), upper.len());

        let needle = term.to_lowercase();
        for found in lower {
            prop_assert!(found.str_field("name").unwrap().to_lowercase().contains(&needle));
        }
    }
}
