use crate::model::{DirectoryGroup, DiscoveredFiles};

/// Turn discovered files into directory groups, most recently touched
/// directory first.
///
/// The sort is stable, so directories with equal `max_mtime` keep their
/// discovery order. Empty directories never produce a group.
#[must_use]
pub fn group_by_recency(discovered: DiscoveredFiles) -> Vec<DirectoryGroup> {
    let mut groups: Vec<DirectoryGroup> = discovered
        .into_iter()
        .filter_map(|(relative, files)| {
            let max_mtime = files.iter().map(|f| f.mtime).max()?;
            Some(DirectoryGroup {
                relative,
                files,
                max_mtime,
            })
        })
        .collect();

    groups.sort_by(|a, b| b.max_mtime.cmp(&a.max_mtime));
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FileRecord;
    use camino::Utf8PathBuf;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn record(relative: &str, secs: i64) -> FileRecord {
        FileRecord {
            path: Utf8PathBuf::from("/p").join(relative),
            relative: Utf8PathBuf::from(relative),
            mtime: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn test_newest_directory_first() {
        let discovered: DiscoveredFiles = [
            record("old/a.py", 10),
            record("new/b.py", 50),
            record("old/c.py", 30),
            record("mid/d.py", 40),
        ]
        .into_iter()
        .collect();

        let groups = group_by_recency(discovered);
        let order: Vec<&str> = groups.iter().map(|g| g.relative.as_str()).collect();
        assert_eq!(order, vec!["new", "mid", "old"]);
        assert_eq!(groups[2].max_mtime, Utc.timestamp_opt(30, 0).unwrap());
    }

    #[test]
    fn test_ties_keep_discovery_order() {
        let discovered: DiscoveredFiles = [
            record("b/x.py", 7),
            record("a/y.py", 7),
            record("c/z.py", 7),
        ]
        .into_iter()
        .collect();

        let order: Vec<String> = group_by_recency(discovered)
            .into_iter()
            .map(|g| g.relative.to_string())
            .collect();
        assert_eq!(order, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(group_by_recency(DiscoveredFiles::new()).is_empty());
    }

    proptest! {
        #[test]
        fn prop_groups_sorted_by_max_mtime(
            files in proptest::collection::vec(("[a-e]", "[a-z]{1,4}", 0i64..1_000_000), 0..40)
        ) {
            let discovered: DiscoveredFiles = files
                .iter()
                .map(|(dir, name, secs)| record(&format!("{dir}/{name}.py"), *secs))
                .collect();
            let total = discovered.file_count();

            let groups = group_by_recency(discovered);

            prop_assert_eq!(groups.iter().map(|g| g.files.len()).sum::<usize>(), total);
            for pair in groups.windows(2) {
                prop_assert!(pair[0].max_mtime >= pair[1].max_mtime);
            }
            for group in &groups {
                let newest = group.files.iter().map(|f| f.mtime).max().unwrap();
                prop_assert_eq!(group.max_mtime, newest);
            }
        }
    }
}
