use teamgrid_core::GridResult;
use teamgrid_domain::{AssignmentStore, DeadlineBoard};
use teamgrid_persistence::{AssignmentApi, DateSpan, DeadlineApi};

/// Rebuild the local stores from the persistence collaborator for the given
/// window. This is the coarse recovery used after any commit failure: no
/// partial retry, the server state simply replaces the local one.
///
/// Kept free-standing so the resynchronization can be tested apart from the
/// failures that trigger it.
pub async fn reload_window(
    assignments: &dyn AssignmentApi,
    deadlines: &dyn DeadlineApi,
    range: DateSpan,
    store: &mut AssignmentStore,
    board: &mut DeadlineBoard,
) -> GridResult<()> {
    let listed_assignments = assignments.list(range).await?;
    let listed_deadlines = deadlines.list(range).await?;

    store.clear();
    for entry in listed_assignments {
        store.insert_loaded(entry.cell, entry.assignment);
    }
    board.clear();
    for entry in listed_deadlines {
        board.insert_loaded(entry);
    }

    tracing::info!(
        "Reloaded window {}..{}: {} assignment(s), {} deadline(s)",
        range.from,
        range.to,
        store.len(),
        board.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use mockall::mock;
    use teamgrid_core::GridError;
    use teamgrid_domain::{
        Assignment, AssignmentContent, AssignmentId, BlockIndex, CellKey, DeadlineEntry,
        DeadlineId, DeadlineKind, DeadlineSlot, PersonId, Span,
    };
    use teamgrid_persistence::{
        AssignmentPatch, DeadlinePatch, MemoryBackend, PersistedAssignment,
    };

    // One mock per trait: the two contracts share method names, so a single
    // struct implementing both would collide on the generated expect_*
    // methods.
    mock! {
        Assignments {}

        #[async_trait]
        impl AssignmentApi for Assignments {
            async fn create(
                &self,
                cell: CellKey,
                content: AssignmentContent,
            ) -> GridResult<Assignment>;
            async fn update(
                &self,
                id: AssignmentId,
                patch: AssignmentPatch,
            ) -> GridResult<Assignment>;
            async fn delete(&self, id: AssignmentId) -> GridResult<()>;
            async fn list(&self, range: DateSpan) -> GridResult<Vec<PersistedAssignment>>;
        }
    }

    mock! {
        Deadlines {}

        #[async_trait]
        impl DeadlineApi for Deadlines {
            async fn create(&self, entry: DeadlineEntry) -> GridResult<DeadlineEntry>;
            async fn update(&self, id: DeadlineId, patch: DeadlinePatch)
                -> GridResult<DeadlineEntry>;
            async fn delete(&self, id: DeadlineId) -> GridResult<()>;
            async fn list(&self, range: DateSpan) -> GridResult<Vec<DeadlineEntry>>;
        }
    }

    fn cell(day: u32, block: u8) -> CellKey {
        CellKey::new(
            PersonId::new("u1"),
            NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            BlockIndex::new(block).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_reload_replaces_local_state() {
        let backend = MemoryBackend::new();
        let content = AssignmentContent {
            subject: None,
            label: "Off".to_string(),
            note: None,
            span: Span::ONE,
        };
        AssignmentApi::create(&backend, cell(10, 0), content)
            .await
            .unwrap();
        teamgrid_persistence::DeadlineApi::create(
            &backend,
            DeadlineEntry::new(
                NaiveDate::from_ymd_opt(2025, 3, 12).unwrap(),
                DeadlineSlot::new(0).unwrap(),
                DeadlineKind::Deadline,
                "Delivery",
            ),
        )
        .await
        .unwrap();

        // Local state diverged: a phantom entry that the server never saw.
        let mut store = AssignmentStore::new();
        store
            .place(
                cell(11, 2),
                teamgrid_domain::Assignment::status("Phantom", Span::ONE),
            )
            .unwrap();
        let mut board = DeadlineBoard::new();

        let range = DateSpan::new(
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
        );
        reload_window(&backend, &backend, range, &mut store, &mut board)
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
        assert!(store.get(&cell(10, 0)).is_some());
        assert!(store.get(&cell(11, 2)).is_none());
        assert_eq!(board.len(), 1);
    }

    fn march() -> DateSpan {
        DateSpan::new(
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_reload_lists_each_collaborator_once() {
        let fixture = PersistedAssignment {
            cell: cell(10, 0),
            assignment: Assignment::status("Off", Span::ONE),
        };
        let deadline = DeadlineEntry::new(
            NaiveDate::from_ymd_opt(2025, 3, 12).unwrap(),
            DeadlineSlot::new(0).unwrap(),
            DeadlineKind::Deadline,
            "Delivery",
        );

        let mut assignments = MockAssignments::new();
        let listed = fixture.clone();
        assignments
            .expect_list()
            .times(1)
            .returning(move |_| Ok(vec![listed.clone()]));
        let mut deadlines = MockDeadlines::new();
        let listed = deadline.clone();
        deadlines
            .expect_list()
            .times(1)
            .returning(move |_| Ok(vec![listed.clone()]));

        let mut store = AssignmentStore::new();
        let mut board = DeadlineBoard::new();
        reload_window(&assignments, &deadlines, march(), &mut store, &mut board)
            .await
            .unwrap();

        assert!(store.get(&fixture.cell).is_some());
        assert!(!board.is_free(deadline.date, deadline.slot));
    }

    #[tokio::test]
    async fn test_failed_list_leaves_local_state_untouched() {
        let mut assignments = MockAssignments::new();
        assignments
            .expect_list()
            .times(1)
            .returning(|_| Ok(Vec::new()));
        // The deadline list fails after the assignment list succeeded;
        // neither store may have been cleared yet.
        let mut deadlines = MockDeadlines::new();
        deadlines
            .expect_list()
            .times(1)
            .returning(|_| Err(GridError::Transport("socket closed".into())));

        let mut store = AssignmentStore::new();
        store
            .place(cell(11, 2), Assignment::status("Local", Span::ONE))
            .unwrap();
        let mut board = DeadlineBoard::new();

        let err = reload_window(&assignments, &deadlines, march(), &mut store, &mut board)
            .await
            .unwrap_err();
        assert!(matches!(err, GridError::Transport(_)));
        assert!(store.get(&cell(11, 2)).is_some());
    }
}
