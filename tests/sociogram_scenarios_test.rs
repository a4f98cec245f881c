//! Sociogram built from submissions stored in SQLite.

mod common;

use common::{batch, members, open_survey, Harness};
use sociogram::domain::errors::DomainError;
use sociogram::domain::models::{Answer, Category, Cohort, EdgeStrength, Polarity, Question};
use sociogram::domain::ports::SurveyRepository;
use uuid::Uuid;

#[tokio::test]
async fn test_positive_majority_member_is_accepted() {
    let h = Harness::new().await;
    let survey = open_survey(vec![
        Question::nomination(1, "Work with?", Polarity::Positive, 3),
        Question::nomination(2, "Avoid?", Polarity::Negative, 3),
    ]);
    let people = members(5);
    let cohort = h.seed(&survey, &people).await;
    let [a, b, c, d, m] = [people[0].id, people[1].id, people[2].id, people[3].id, people[4].id];
    let (q1, q2) = (survey.questions[0].id, survey.questions[1].id);
    let service = h.submissions();

    service
        .submit(batch(&survey, &cohort, a, vec![Answer::nominations(q1, &[m, b, c])]))
        .await
        .unwrap();
    service
        .submit(batch(&survey, &cohort, b, vec![Answer::nominations(q2, &[c, m, d])]))
        .await
        .unwrap();

    let sociogram = h.sociograms().build(survey.id, cohort.id).await.unwrap();
    let node = sociogram.node(m).unwrap();
    assert_eq!((node.positive, node.negative, node.impact), (3, 2, 5));
    assert_eq!(node.category, Category::Accepted);

    let rejected = sociogram.node(c).unwrap();
    assert_eq!((rejected.positive, rejected.negative), (1, 3));
    assert_eq!(rejected.category, Category::Rejected);

    // D was picked once, in third place.
    let idle = sociogram.node(d).unwrap();
    assert_eq!(idle.in_degree, 1);
    assert_eq!(sociogram.max_impact, 5);
    assert_eq!(sociogram.categories.total(), 5);
    assert_eq!(sociogram.total_possible, 5 * 9 + 5 * 9);
}

#[tokio::test]
async fn test_mutual_pair_shares_points() {
    let h = Harness::new().await;
    let survey = open_survey(vec![Question::nomination(1, "Work with?", Polarity::Positive, 3)]);
    let people = members(4);
    let cohort = h.seed(&survey, &people).await;
    let ids: Vec<Uuid> = people.iter().map(|p| p.id).collect();
    let q = survey.questions[0].id;
    let service = h.submissions();

    // A ranks B first (3 points), B ranks A second (2 points).
    service
        .submit(batch(&survey, &cohort, ids[0], vec![Answer::nominations(q, &[ids[1], ids[2], ids[3]])]))
        .await
        .unwrap();
    service
        .submit(batch(&survey, &cohort, ids[1], vec![Answer::nominations(q, &[ids[2], ids[0], ids[3]])]))
        .await
        .unwrap();

    let sociogram = h.sociograms().build(survey.id, cohort.id).await.unwrap();
    let forward = sociogram.edge(ids[0], ids[1]).unwrap();
    let backward = sociogram.edge(ids[1], ids[0]).unwrap();

    assert!(forward.mutual && backward.mutual);
    assert_eq!((forward.weight, backward.weight), (3, 2));
    assert_eq!(forward.mutual_points, 5);
    assert_eq!(backward.mutual_points, 5);
    assert_eq!(sociogram.total_possible, 36);
    assert!((forward.percentage - 13.89).abs() < f64::EPSILON);
    assert_eq!(forward.strength, EdgeStrength::Weak);

    let one_way = sociogram.edge(ids[0], ids[2]).unwrap();
    assert!(!one_way.mutual);
    assert_eq!(one_way.mutual_points, one_way.weight);
    assert_eq!(sociogram.completed_members, 2);
}

#[tokio::test]
async fn test_cohort_without_nominations_is_all_invisible() {
    let h = Harness::new().await;
    let survey = open_survey(vec![Question::nomination(1, "Work with?", Polarity::Positive, 1)]);
    let people = members(3);
    let cohort = h.seed(&survey, &people).await;

    let sociogram = h.sociograms().build(survey.id, cohort.id).await.unwrap();

    assert!(sociogram.edges.is_empty());
    assert_eq!(sociogram.max_impact, 0);
    assert_eq!(sociogram.categories.invisible, 3);
    assert!(sociogram.nodes.iter().all(|n| n.category == Category::Invisible));
}

#[tokio::test]
async fn test_rebuild_is_identical() {
    let h = Harness::new().await;
    let survey = open_survey(vec![Question::nomination(1, "Work with?", Polarity::Positive, 2)]);
    let people = members(4);
    let cohort = h.seed(&survey, &people).await;
    let q = survey.questions[0].id;
    let service = h.submissions();
    for (i, person) in people.iter().enumerate() {
        let picks = [people[(i + 1) % 4].id, people[(i + 2) % 4].id];
        service
            .submit(batch(&survey, &cohort, person.id, vec![Answer::nominations(q, &picks)]))
            .await
            .unwrap();
    }

    let sociograms = h.sociograms();
    let first = sociograms.build(survey.id, cohort.id).await.unwrap();
    let second = sociograms.build(survey.id, cohort.id).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.edges.len(), 8);
    assert_eq!(first.completed_members, 4);
}

#[tokio::test]
async fn test_unknown_cohort_is_reported() {
    let h = Harness::new().await;
    let survey = open_survey(vec![Question::nomination(1, "Work with?", Polarity::Positive, 1)]);
    h.seed(&survey, &members(2)).await;

    let err = h.sociograms().build(survey.id, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, DomainError::CohortNotFound { .. }));

    let err = h.sociograms().build(Uuid::new_v4(), Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, DomainError::SurveyNotFound(_)));
}

#[tokio::test]
async fn test_build_all_covers_every_assigned_cohort() {
    let h = Harness::new().await;
    let survey = open_survey(vec![Question::nomination(1, "Work with?", Polarity::Positive, 1)]);
    let people = members(5);
    let first = h.seed(&survey, &people[..3]).await;

    let second = Cohort::new("1B").with_members(people[3..].iter().map(|p| p.id));
    for member in &people[3..] {
        h.surveys.save_member(member).await.unwrap();
    }
    h.surveys.save_cohort(&second).await.unwrap();
    h.surveys.assign_cohort(survey.id, second.id).await.unwrap();

    let q = survey.questions[0].id;
    h.submissions()
        .submit(batch(&survey, &second, people[3].id, vec![Answer::nominations(q, &[people[4].id])]))
        .await
        .unwrap();

    let mut all = h.sociograms().build_all(survey.id).await.unwrap();
    all.sort_by(|a, b| a.cohort_label.cmp(&b.cohort_label));

    assert_eq!(all.len(), 2);
    assert_eq!((all[0].cohort_id, all[0].total_members), (first.id, 3));
    assert!(all[0].edges.is_empty());
    assert_eq!((all[1].cohort_id, all[1].total_members), (second.id, 2));
    assert_eq!(all[1].completed_members, 1);
    assert_eq!(all[1].edges.len(), 1);

    let single = h.sociograms().build(survey.id, second.id).await.unwrap();
    assert_eq!(single, all[1]);

    let err = h.sociograms().build_all(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, DomainError::SurveyNotFound(_)));
}
