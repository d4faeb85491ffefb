//! The run-wide list of files chosen for download.

use std::path::Path;

use tracing::trace;

use crate::extract::{DownloadLink, DownloadTask};

/// Chosen download links in the order they were picked.
///
/// Global ordinals run 1..=N across every patch and platform and have no
/// relation to the per-pair ordinals the operator chose from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadList {
    links: Vec<DownloadLink>,
}

impl DownloadList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `link` and returns its global ordinal.
    pub fn push(&mut self, link: DownloadLink) -> usize {
        trace!(url = %link.url, ordinal = self.links.len() + 1, "queued for download");
        self.links.push(link);
        self.links.len()
    }

    /// `(global ordinal, link)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &DownloadLink)> {
        self.links
            .iter()
            .enumerate()
            .map(|(index, link)| (index + 1, link))
    }

    /// Number of queued files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// True when nothing was chosen.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// One download task per queued link, writing into `stage_dir`, in list order.
    #[must_use]
    pub fn tasks(&self, stage_dir: &Path) -> Vec<DownloadTask> {
        self.links
            .iter()
            .map(|link| DownloadTask::for_link(link, stage_dir))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn link(name: &str) -> DownloadLink {
        DownloadLink::new(
            format!("https://updates.oracle.com/Orion/Download/process_form/{name}?a=1"),
            name,
        )
    }

    #[test]
    fn test_push_assigns_dense_global_ordinals() {
        let mut list = DownloadList::new();
        assert_eq!(list.push(link("a.zip")), 1);
        assert_eq!(list.push(link("b.zip")), 2);
        let ordinals: Vec<usize> = list.iter().map(|(ordinal, _)| ordinal).collect();
        assert_eq!(ordinals, vec![1, 2]);
    }

    #[test]
    fn test_tasks_preserve_order_and_stage_dir() {
        let mut list = DownloadList::new();
        list.push(link("p2_Linux.zip"));
        list.push(link("p1_Linux.zip"));

        let tasks = list.tasks(Path::new("stage"));

        let destinations: Vec<PathBuf> = tasks.into_iter().map(|t| t.destination).collect();
        assert_eq!(
            destinations,
            vec![
                PathBuf::from("stage/p2_Linux.zip"),
                PathBuf::from("stage/p1_Linux.zip")
            ]
        );
    }

    #[test]
    fn test_every_queued_link_becomes_a_task() {
        let mut list = DownloadList::new();
        for name in ["p1_Linux.zip", "p1_Linux.zip", "p2_AIX.zip"] {
            list.push(link(name));
        }

        let tasks = list.tasks(Path::new("stage"));

        assert_eq!(tasks.len(), list.len());
        assert_eq!(
            tasks[2].source_url,
            "https://updates.oracle.com/Orion/Download/process_form/p2_AIX.zip?a=1"
        );
    }
}
