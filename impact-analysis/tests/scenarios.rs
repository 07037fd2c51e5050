//! End-to-end scenarios run against real `git2` repositories built by
//! `impact-testing`, rather than the in-memory fixtures used by the
//! algorithmic modules' own unit tests.

use std::collections::HashSet;

use impact::{AnalyzerConfig, CancellationToken, CommitId, RepoAnalyzer};
use impact_testing::{Event, TestRepository};

fn single(repo: &TestRepository, label: &str) -> eyre::Result<CommitId> {
    Ok(*repo.commit_ids(&[label])?.iter().next().unwrap())
}

fn analyze(
    repo: &TestRepository,
    introduced: &[CommitId],
    fixed: &[CommitId],
    last_affected: &[CommitId],
    limit: &[CommitId],
) -> eyre::Result<HashSet<CommitId>> {
    let graph = repo.graph();
    let analyzer = RepoAnalyzer::new(AnalyzerConfig::default());
    let result = analyzer.analyze(&graph, introduced, fixed, last_affected, limit, &CancellationToken::new())?;
    Ok(result.commits)
}

#[test]
fn linear_introduced_and_fixed() -> eyre::Result<()> {
    let _ = tracing_subscriber::fmt::try_init();
    let mut repo = TestRepository::new()?;
    let a = single(&repo, "A")?;
    let b = repo.add_commit("B", &[a], Event::Introduced)?;
    let c = repo.add_commit("C", &[b], Event::None)?;
    repo.add_commit("D", &[c], Event::Fixed)?;

    let v = analyze(&repo, &[b], &repo.ranges().1, &[], &[])?;
    assert_eq!(v, HashSet::from([b, c]));
    Ok(())
}

#[test]
fn linear_introduced_and_limit() -> eyre::Result<()> {
    let mut repo = TestRepository::new()?;
    let a = single(&repo, "A")?;
    let b = repo.add_commit("B", &[a], Event::Introduced)?;
    let c = repo.add_commit("C", &[b], Event::None)?;
    repo.add_commit("D", &[c], Event::Limit)?;

    let v = analyze(&repo, &[b], &[], &[], &repo.ranges().3)?;
    assert_eq!(v, HashSet::from([b, c]));
    Ok(())
}

#[test]
fn linear_introduced_and_last_affected() -> eyre::Result<()> {
    let mut repo = TestRepository::new()?;
    let a = single(&repo, "A")?;
    let b = repo.add_commit("B", &[a], Event::Introduced)?;
    let c = repo.add_commit("C", &[b], Event::None)?;
    let d = repo.add_commit("D", &[c], Event::LastAffected)?;

    let v = analyze(&repo, &[b], &[], &repo.ranges().2, &[])?;
    assert_eq!(v, HashSet::from([b, c, d]));
    Ok(())
}

#[test]
fn branch_propagation_of_vulnerability() -> eyre::Result<()> {
    // A -> B -> C -> D, with side branch C -> E; introduced=B, fixed=D.
    let mut repo = TestRepository::new()?;
    let a = single(&repo, "A")?;
    let b = repo.add_commit("B", &[a], Event::Introduced)?;
    let c = repo.add_commit("C", &[b], Event::None)?;
    repo.create_branch("side")?;
    repo.checkout("side");
    let e = repo.add_commit("E", &[c], Event::None)?;
    repo.checkout("master");
    repo.add_commit("D", &[c], Event::Fixed)?;

    let v = analyze(&repo, &[b], &repo.ranges().1, &[], &[])?;
    assert_eq!(v, HashSet::from([b, c, e]));
    Ok(())
}

#[test]
fn merge_heals_only_merged_side() -> eyre::Result<()> {
    // A -> B -> D -> E, with A -> C -> D merging C into main at D;
    // introduced=B, fixed=E.
    let mut repo = TestRepository::new()?;
    let a = single(&repo, "A")?;
    repo.create_branch("side")?;
    let b = repo.add_commit("B", &[a], Event::Introduced)?;
    repo.checkout("side");
    let c = repo.add_commit("C", &[a], Event::None)?;
    repo.checkout("master");
    let d = repo.merge("D", c, Event::None)?;
    repo.add_commit("E", &[d], Event::Fixed)?;

    let v = analyze(&repo, &[b], &repo.ranges().1, &[], &[])?;
    assert_eq!(v, HashSet::from([b, d]));
    Ok(())
}

#[test]
fn branch_with_limit_and_separate_fix() -> eyre::Result<()> {
    // A -> B -> C -> E, with side B -> D; introduced=B, limit=D, fixed=E.
    // The limit only excludes D's own branch; C and its fix at E are
    // unrelated to D, so C stays affected.
    let mut repo = TestRepository::new()?;
    let a = single(&repo, "A")?;
    let b = repo.add_commit("B", &[a], Event::Introduced)?;
    repo.create_branch("side")?;
    repo.checkout("side");
    repo.add_commit("D", &[b], Event::Limit)?;
    repo.checkout("master");
    let c = repo.add_commit("C", &[b], Event::None)?;
    repo.add_commit("E", &[c], Event::Fixed)?;

    let v = analyze(&repo, &[b], &repo.ranges().1, &[], &repo.ranges().3)?;
    assert_eq!(v, HashSet::from([b, c]));
    Ok(())
}

#[test]
fn two_introduced_two_fixed_intercalated() -> eyre::Result<()> {
    // A -> B -> C -> D -> E, introduced={B,D}, fixed={C,E}.
    let mut repo = TestRepository::new()?;
    let a = single(&repo, "A")?;
    let b = repo.add_commit("B", &[a], Event::Introduced)?;
    let c = repo.add_commit("C", &[b], Event::Fixed)?;
    let d = repo.add_commit("D", &[c], Event::Introduced)?;
    repo.add_commit("E", &[d], Event::Fixed)?;

    let v = analyze(&repo, &repo.ranges().0, &repo.ranges().1, &[], &[])?;
    assert_eq!(v, HashSet::from([b, d]));
    Ok(())
}

#[test]
fn fix_from_merged_branch_propagates() -> eyre::Result<()> {
    // A -> B -> D -> E, side A -> C -> D where C is fixed;
    // introduced=B, fixed={C,E}.
    let mut repo = TestRepository::new()?;
    let a = single(&repo, "A")?;
    repo.create_branch("side")?;
    let b = repo.add_commit("B", &[a], Event::Introduced)?;
    repo.checkout("side");
    let c = repo.add_commit("C", &[a], Event::Fixed)?;
    repo.checkout("master");
    let d = repo.merge("D", c, Event::None)?;
    repo.add_commit("E", &[d], Event::Fixed)?;

    let v = analyze(&repo, &[b], &repo.ranges().1, &[], &[])?;
    assert_eq!(v, HashSet::from([b]));
    Ok(())
}

#[test]
fn branch_propagation_without_any_terminator() -> eyre::Result<()> {
    let mut repo = TestRepository::new()?;
    let a = single(&repo, "A")?;
    let b = repo.add_commit("B", &[a], Event::Introduced)?;
    let c = repo.add_commit("C", &[b], Event::None)?;
    repo.create_branch("side")?;
    repo.checkout("side");
    let d = repo.add_commit("D", &[c], Event::None)?;
    repo.checkout("master");
    let e = repo.add_commit("E", &[c], Event::None)?;

    let v = analyze(&repo, &[b], &[], &[], &[])?;
    assert_eq!(v, HashSet::from([b, c, d, e]));
    Ok(())
}

#[test]
fn merge_without_any_fix() -> eyre::Result<()> {
    let mut repo = TestRepository::new()?;
    let a = single(&repo, "A")?;
    repo.create_branch("side")?;
    let b = repo.add_commit("B", &[a], Event::Introduced)?;
    repo.checkout("side");
    let c = repo.add_commit("C", &[a], Event::None)?;
    repo.checkout("master");
    let d = repo.merge("D", c, Event::None)?;
    repo.create_branch("post-merge")?;
    repo.checkout("post-merge");
    let f = repo.add_commit("F", &[d], Event::None)?;
    repo.checkout("master");
    let g = repo.add_commit("G", &[d], Event::None)?;

    let v = analyze(&repo, &[b], &[], &[], &[])?;
    assert_eq!(v, HashSet::from([b, d, f, g]));
    Ok(())
}

#[test]
fn reintroduction_after_fix_does_not_bleed_across() -> eyre::Result<()> {
    // Same shape as `two_introduced_two_fixed_intercalated`, checked
    // separately since it's what the original Python suite exercised as
    // its own scenario: a fix followed by an unrelated re-introduction.
    let mut repo = TestRepository::new()?;
    let a = single(&repo, "A")?;
    let b = repo.add_commit("B", &[a], Event::Introduced)?;
    let c = repo.add_commit("C", &[b], Event::Fixed)?;
    let d = repo.add_commit("D", &[c], Event::Introduced)?;
    repo.add_commit("E", &[d], Event::Fixed)?;

    let v = analyze(&repo, &repo.ranges().0, &repo.ranges().1, &[], &[])?;
    assert_eq!(v, HashSet::from([b, d]));
    Ok(())
}

#[test]
fn limit_on_a_branch_introduced_continues_past_branch_point() -> eyre::Result<()> {
    let mut repo = TestRepository::new()?;
    let a = single(&repo, "A")?;
    let b = repo.add_commit("B", &[a], Event::Introduced)?;
    repo.create_branch("side")?;
    repo.checkout("side");
    repo.add_commit("M", &[b], Event::Limit)?;
    repo.checkout("master");
    let c = repo.add_commit("C", &[b], Event::None)?;
    let d = repo.add_commit("D", &[c], Event::None)?;

    let v = analyze(&repo, &[b], &[], &[], &repo.ranges().3)?;
    assert_eq!(v, HashSet::from([b, c, d]));
    Ok(())
}

#[test]
fn cherry_pick_detection_on_and_off() -> eyre::Result<()> {
    let mut repo = TestRepository::new()?;
    let a = single(&repo, "A")?;
    let b = repo.add_commit("B", &[a], Event::Introduced)?;

    repo.create_branch("unrelated")?;
    repo.checkout("unrelated");
    let unrelated_base = repo.add_commit("Base", &[a], Event::None)?;
    let backport = repo.cherry_pick("Backport of B", unrelated_base, b)?;

    let graph = repo.graph();
    let cancellation = CancellationToken::new();

    let without_detection = RepoAnalyzer::new(AnalyzerConfig::default())
        .analyze(&graph, &[b], &[], &[], &[], &cancellation)?;
    assert!(!without_detection.commits.contains(&backport));

    let with_detection = RepoAnalyzer::new(AnalyzerConfig { detect_cherrypicks: true })
        .analyze(&graph, &[b], &[], &[], &[], &cancellation)?;
    assert!(with_detection.commits.contains(&backport));
    Ok(())
}

#[test]
fn remote_only_branch_is_still_part_of_the_graph() -> eyre::Result<()> {
    // The analyzer enumerates both local and remote refs as reachability
    // roots (§4.1): a fix published only on a remote-tracking branch, with
    // the local branch deleted, must still be found.
    let mut repo = TestRepository::new()?;
    let a = single(&repo, "A")?;
    let b = repo.add_commit("B", &[a], Event::Introduced)?;
    repo.create_branch("release")?;
    repo.checkout("release");
    let c = repo.add_commit("C", &[b], Event::None)?;
    repo.add_commit("D", &[c], Event::Fixed)?;
    repo.create_remote_branch()?;

    let v = analyze(&repo, &[b], &repo.ranges().1, &[], &[])?;
    assert_eq!(v, HashSet::from([b, c]));
    Ok(())
}
