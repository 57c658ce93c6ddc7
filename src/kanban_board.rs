use crate::task::{Bucket, Task};

/// What to do with a task whose status is none of the three buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnrecognizedStatus {
    /// Leave it off the board entirely (it is still counted in
    /// [`GroupedTasks::excluded`]).
    #[default]
    Exclude,
    /// Show it in the pending column.
    Pending,
}

/// Tasks partitioned into the three board columns. Order inside a column is
/// local to the client and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupedTasks {
    buckets: [Vec<Task>; 3],
    excluded: usize,
}

impl GroupedTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Partitions a flat list, keeping the input order inside each column.
    pub fn from_tasks(tasks: impl IntoIterator<Item = Task>, policy: UnrecognizedStatus) -> Self {
        let mut grouped = Self::new();
        for task in tasks {
            let bucket = match (task.bucket(), policy) {
                (Some(bucket), _) => bucket,
                (None, UnrecognizedStatus::Pending) => Bucket::Pending,
                (None, UnrecognizedStatus::Exclude) => {
                    tracing::debug!(
                        task_id = %task.id,
                        status = %task.status,
                        "task has unrecognized status"
                    );
                    grouped.excluded += 1;
                    continue;
                }
            };
            grouped.buckets[bucket.index()].push(task);
        }
        grouped
    }

    pub fn bucket(&self, bucket: Bucket) -> &[Task] {
        &self.buckets[bucket.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Bucket, &[Task])> {
        Bucket::ALL
            .into_iter()
            .map(move |bucket| (bucket, self.bucket(bucket)))
    }

    /// Number of fetched tasks left off the board because of their status.
    pub fn excluded(&self) -> usize {
        self.excluded
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn locate(&self, id: &str) -> Option<(Bucket, usize)> {
        self.iter().find_map(|(bucket, tasks)| {
            tasks
                .iter()
                .position(|t| t.id == id)
                .map(|index| (bucket, index))
        })
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.locate(id)
            .and_then(|(bucket, index)| self.get(bucket, index))
    }

    pub fn get(&self, bucket: Bucket, index: usize) -> Option<&Task> {
        self.bucket(bucket).get(index)
    }

    /// Moves a task to `to`, inserting at `index` (clamped to the column
    /// length) after it has been taken out of its current column. Returns
    /// false if the id is not on the board.
    pub fn move_task(&mut self, id: &str, to: Bucket, index: usize) -> bool {
        let Some((from, at)) = self.locate(id) else {
            return false;
        };
        let task = self.buckets[from.index()].remove(at);
        let column = &mut self.buckets[to.index()];
        let index = index.min(column.len());
        column.insert(index, task);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, status: &str) -> Task {
        Task {
            id: id.into(),
            user_id: None,
            title: format!("task {id}"),
            description: None,
            status: status.into(),
            due_date: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn ids(grouped: &GroupedTasks, bucket: Bucket) -> Vec<&str> {
        grouped.bucket(bucket).iter().map(|t| t.id.as_str()).collect()
    }

    fn sample() -> Vec<Task> {
        vec![
            task("a", "pending"),
            task("b", "completed"),
            task("c", "pending"),
            task("d", "in-progress"),
            task("e", "archived"),
        ]
    }

    #[test]
    fn every_known_task_lands_in_exactly_one_bucket() {
        let grouped = GroupedTasks::from_tasks(sample(), UnrecognizedStatus::Exclude);
        assert_eq!(ids(&grouped, Bucket::Pending), ["a", "c"]);
        assert_eq!(ids(&grouped, Bucket::InProgress), ["d"]);
        assert_eq!(ids(&grouped, Bucket::Completed), ["b"]);
        assert_eq!(grouped.len(), 4);
        for t in sample().iter().filter(|t| t.bucket().is_some()) {
            let hits = grouped
                .iter()
                .filter(|(_, tasks)| tasks.iter().any(|x| x.id == t.id))
                .count();
            assert_eq!(hits, 1, "task {} placed {hits} times", t.id);
        }
    }

    #[test]
    fn unrecognized_status_policies_are_distinguishable() {
        let excluded = GroupedTasks::from_tasks(sample(), UnrecognizedStatus::Exclude);
        assert_eq!(excluded.excluded(), 1);
        assert!(excluded.locate("e").is_none());

        let defaulted = GroupedTasks::from_tasks(sample(), UnrecognizedStatus::Pending);
        assert_eq!(defaulted.excluded(), 0);
        assert_eq!(ids(&defaulted, Bucket::Pending), ["a", "c", "e"]);

        assert_ne!(excluded, defaulted);
    }

    #[test]
    fn grouping_is_deterministic() {
        let first = GroupedTasks::from_tasks(sample(), UnrecognizedStatus::Exclude);
        let second = GroupedTasks::from_tasks(sample(), UnrecognizedStatus::Exclude);
        assert_eq!(first, second);
    }

    #[test]
    fn move_across_buckets_clamps_index() {
        let mut grouped = GroupedTasks::from_tasks(sample(), UnrecognizedStatus::Exclude);
        assert!(grouped.move_task("a", Bucket::Completed, 99));
        assert_eq!(ids(&grouped, Bucket::Pending), ["c"]);
        assert_eq!(ids(&grouped, Bucket::Completed), ["b", "a"]);
        assert_eq!(grouped.len(), 4);
    }

    #[test]
    fn move_within_bucket_reorders() {
        let mut grouped = GroupedTasks::from_tasks(
            vec![task("a", "pending"), task("b", "pending"), task("c", "pending")],
            UnrecognizedStatus::Exclude,
        );
        grouped.move_task("a", Bucket::Pending, 2);
        assert_eq!(ids(&grouped, Bucket::Pending), ["b", "c", "a"]);
        grouped.move_task("a", Bucket::Pending, 0);
        assert_eq!(ids(&grouped, Bucket::Pending), ["a", "b", "c"]);
    }

    #[test]
    fn moving_unknown_id_is_refused() {
        let mut grouped = GroupedTasks::from_tasks(sample(), UnrecognizedStatus::Exclude);
        let before = grouped.clone();
        assert!(!grouped.move_task("zzz", Bucket::Pending, 0));
        assert_eq!(grouped, before);
    }
}
