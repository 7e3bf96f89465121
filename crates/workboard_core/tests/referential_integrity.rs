use rusqlite::Connection;
use workboard_core::db::open_db_in_memory;
use workboard_core::{
    EntityKind, ErrorKind, GoalPatch, GoalRepository, LinkKind, LinkRepository, NewGoal,
    NewOutcome, NewProblem, NewProject, NewTask, OutcomePatch, OutcomeRepository, ProblemPatch,
    ProblemRepository, ProjectRepository, SqliteGoalRepository, SqliteLinkRepository,
    SqliteOutcomeRepository, SqliteProblemRepository, SqliteProjectRepository,
    SqliteTaskRepository, StoreError, TaskRepository, TaskStatus, ValidationError,
};

struct Repos<'conn> {
    projects: SqliteProjectRepository<'conn>,
    tasks: SqliteTaskRepository<'conn>,
    problems: SqliteProblemRepository<'conn>,
    outcomes: SqliteOutcomeRepository<'conn>,
    goals: SqliteGoalRepository<'conn>,
    links: SqliteLinkRepository<'conn>,
}

fn repos(conn: &Connection) -> Repos<'_> {
    Repos {
        projects: SqliteProjectRepository::try_new(conn).unwrap(),
        tasks: SqliteTaskRepository::try_new(conn).unwrap(),
        problems: SqliteProblemRepository::try_new(conn).unwrap(),
        outcomes: SqliteOutcomeRepository::try_new(conn).unwrap(),
        goals: SqliteGoalRepository::try_new(conn).unwrap(),
        links: SqliteLinkRepository::try_new(conn).unwrap(),
    }
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn task_for_missing_project_is_reference_error_and_writes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let r = repos(&conn);

    let err = r.tasks.create_task(&NewTask::new(99, "orphan")).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Reference {
            kind: EntityKind::Project,
            id: 99
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Reference);
    assert_eq!(count(&conn, "tasks"), 0);
}

#[test]
fn other_dangling_references_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let r = repos(&conn);

    assert_eq!(
        r.tasks.create_note(5, "hello").unwrap_err().kind(),
        ErrorKind::Reference
    );
    assert_eq!(
        r.outcomes
            .create_outcome(&NewOutcome::new(5, "ship"))
            .unwrap_err()
            .kind(),
        ErrorKind::Reference
    );

    let mut problem = NewProblem::titled("dangling task");
    problem.task_id = Some(3);
    assert_eq!(
        r.problems.create_problem(&problem).unwrap_err().kind(),
        ErrorKind::Reference
    );

    let mut goal = NewGoal::titled("dangling project");
    goal.project_id = Some(3);
    assert_eq!(
        r.goals.create_goal(&goal).unwrap_err().kind(),
        ErrorKind::Reference
    );

    assert_eq!(count(&conn, "task_notes"), 0);
    assert_eq!(count(&conn, "outcomes"), 0);
    assert_eq!(count(&conn, "problems"), 0);
    assert_eq!(count(&conn, "goals"), 0);
}

#[test]
fn deleting_task_keeps_problem_project_and_clears_task() {
    let conn = open_db_in_memory().unwrap();
    let r = repos(&conn);

    let p1 = r.projects.create_project(&NewProject::named("P1")).unwrap();
    let mut t1 = NewTask::new(p1.id, "T1");
    t1.status = Some(TaskStatus::Pending);
    let t1 = r.tasks.create_task(&t1).unwrap();

    let mut leaky = NewProblem::titled("Leaky auth");
    leaky.task_id = Some(t1.id);
    let leaky = r.problems.create_problem(&leaky).unwrap();
    assert_eq!(leaky.project_id, Some(p1.id));
    assert_eq!(leaky.task_id, Some(t1.id));

    r.tasks.delete_task(t1.id).unwrap();

    let after = r.problems.get_problem(leaky.id).unwrap();
    assert_eq!(after.project_id, Some(p1.id));
    assert_eq!(after.task_id, None);
    assert!(after.updated_at > leaky.updated_at);
}

#[test]
fn deleting_task_removes_notes_and_clears_outcome_and_goal_links() {
    let conn = open_db_in_memory().unwrap();
    let r = repos(&conn);

    let project = r.projects.create_project(&NewProject::named("P")).unwrap();
    let task = r.tasks.create_task(&NewTask::new(project.id, "T")).unwrap();
    r.tasks.create_note(task.id, "n1").unwrap();
    r.tasks.create_note(task.id, "n2").unwrap();

    let mut outcome = NewOutcome::new(project.id, "O");
    outcome.task_id = Some(task.id);
    let outcome = r.outcomes.create_outcome(&outcome).unwrap();

    let mut goal = NewGoal::titled("G");
    goal.task_id = Some(task.id);
    let goal = r.goals.create_goal(&goal).unwrap();

    r.tasks.delete_task(task.id).unwrap();

    assert_eq!(count(&conn, "task_notes"), 0);
    assert_eq!(
        r.tasks.get_task(task.id).unwrap_err().kind(),
        ErrorKind::NotFound
    );

    let outcome = r.outcomes.get_outcome(outcome.id).unwrap();
    assert_eq!(outcome.project_id, project.id);
    assert_eq!(outcome.task_id, None);

    let goal = r.goals.get_goal(goal.id).unwrap();
    assert_eq!(goal.project_id, Some(project.id));
    assert_eq!(goal.task_id, None);
}

#[test]
fn deleting_project_cascades_and_detaches() {
    let conn = open_db_in_memory().unwrap();
    let r = repos(&conn);

    let doomed = r.projects.create_project(&NewProject::named("doomed")).unwrap();
    let survivor = r.projects.create_project(&NewProject::named("survivor")).unwrap();

    let task = r.tasks.create_task(&NewTask::new(doomed.id, "T")).unwrap();
    r.tasks.create_note(task.id, "note").unwrap();
    let kept_task = r
        .tasks
        .create_task(&NewTask::new(survivor.id, "kept"))
        .unwrap();
    r.outcomes
        .create_outcome(&NewOutcome::new(doomed.id, "O"))
        .unwrap();

    let mut problem = NewProblem::titled("bound to task");
    problem.task_id = Some(task.id);
    let problem = r.problems.create_problem(&problem).unwrap();

    let mut goal = NewGoal::titled("bound to project");
    goal.project_id = Some(doomed.id);
    let goal = r.goals.create_goal(&goal).unwrap();
    r.links.link(LinkKind::Goal, goal.id, survivor.id).unwrap();
    r.links.link(LinkKind::Problem, problem.id, doomed.id).unwrap();

    r.projects.delete_project(doomed.id).unwrap();

    assert_eq!(
        r.projects.get_project(doomed.id).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(count(&conn, "tasks"), 1);
    assert_eq!(r.tasks.get_task(kept_task.id).unwrap(), kept_task);
    assert_eq!(count(&conn, "task_notes"), 0);
    assert_eq!(count(&conn, "outcomes"), 0);

    let problem = r.problems.get_problem(problem.id).unwrap();
    assert_eq!(problem.project_id, None);
    assert_eq!(problem.task_id, None);
    assert!(r
        .links
        .projects_for(LinkKind::Problem, problem.id)
        .unwrap()
        .is_empty());

    let goal = r.goals.get_goal(goal.id).unwrap();
    assert_eq!(goal.project_id, None);
    assert_eq!(
        r.links.projects_for(LinkKind::Goal, goal.id).unwrap(),
        vec![survivor.id]
    );
}

#[test]
fn goal_links_follow_project_deletion() {
    let conn = open_db_in_memory().unwrap();
    let r = repos(&conn);

    let g1 = r.goals.create_goal(&NewGoal::titled("G1")).unwrap();
    let p1 = r.projects.create_project(&NewProject::named("P1")).unwrap();
    let p2 = r.projects.create_project(&NewProject::named("P2")).unwrap();

    assert!(r.links.link(LinkKind::Goal, g1.id, p1.id).unwrap());
    assert!(r.links.link(LinkKind::Goal, g1.id, p2.id).unwrap());
    assert_eq!(
        r.links.projects_for(LinkKind::Goal, g1.id).unwrap(),
        vec![p1.id, p2.id]
    );

    r.projects.delete_project(p1.id).unwrap();
    assert_eq!(
        r.links.projects_for(LinkKind::Goal, g1.id).unwrap(),
        vec![p2.id]
    );
    assert_eq!(r.goals.get_goal(g1.id).unwrap().project_id, None);
}

#[test]
fn link_is_idempotent_and_unlink_restores_prior_state() {
    let conn = open_db_in_memory().unwrap();
    let r = repos(&conn);

    let project = r.projects.create_project(&NewProject::named("P")).unwrap();
    let problem = r
        .problems
        .create_problem(&NewProblem::titled("X"))
        .unwrap();

    assert!(r.links.link(LinkKind::Problem, problem.id, project.id).unwrap());
    assert!(!r.links.link(LinkKind::Problem, problem.id, project.id).unwrap());
    assert_eq!(
        r.links.children_for(project.id, LinkKind::Problem).unwrap(),
        vec![problem.id]
    );
    assert!(r
        .links
        .children_for(project.id, LinkKind::Goal)
        .unwrap()
        .is_empty());

    r.links
        .unlink(LinkKind::Problem, problem.id, project.id)
        .unwrap();
    assert!(r
        .links
        .projects_for(LinkKind::Problem, problem.id)
        .unwrap()
        .is_empty());
    assert_eq!(r.problems.get_problem(problem.id).unwrap().project_id, None);

    let err = r
        .links
        .unlink(LinkKind::Problem, problem.id, project.id)
        .unwrap_err();
    assert!(matches!(err, StoreError::LinkNotFound { .. }));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn link_with_missing_ends_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let r = repos(&conn);

    let project = r.projects.create_project(&NewProject::named("P")).unwrap();
    let goal = r.goals.create_goal(&NewGoal::titled("G")).unwrap();

    assert_eq!(
        r.links
            .link(LinkKind::Goal, 404, project.id)
            .unwrap_err()
            .kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        r.links.link(LinkKind::Goal, goal.id, 404).unwrap_err().kind(),
        ErrorKind::Reference
    );
    assert_eq!(
        r.links
            .projects_for(LinkKind::Goal, 404)
            .unwrap_err()
            .kind(),
        ErrorKind::NotFound
    );
    assert_eq!(count(&conn, "goal_projects"), 0);
}

#[test]
fn primary_project_and_junction_links_are_independent() {
    let conn = open_db_in_memory().unwrap();
    let r = repos(&conn);

    let primary = r.projects.create_project(&NewProject::named("primary")).unwrap();
    let extra = r.projects.create_project(&NewProject::named("extra")).unwrap();

    let mut goal = NewGoal::titled("G");
    goal.project_id = Some(primary.id);
    let goal = r.goals.create_goal(&goal).unwrap();
    r.links.link(LinkKind::Goal, goal.id, extra.id).unwrap();

    assert_eq!(r.goals.get_goal(goal.id).unwrap().project_id, Some(primary.id));
    assert_eq!(
        r.links.projects_for(LinkKind::Goal, goal.id).unwrap(),
        vec![extra.id]
    );
}

#[test]
fn deleting_linked_child_removes_its_junction_rows() {
    let conn = open_db_in_memory().unwrap();
    let r = repos(&conn);

    let project = r.projects.create_project(&NewProject::named("P")).unwrap();
    let goal = r.goals.create_goal(&NewGoal::titled("G")).unwrap();
    r.links.link(LinkKind::Goal, goal.id, project.id).unwrap();

    r.goals.delete_goal(goal.id).unwrap();
    assert_eq!(count(&conn, "goal_projects"), 0);
    assert!(r
        .links
        .children_for(project.id, LinkKind::Goal)
        .unwrap()
        .is_empty());
}

#[test]
fn project_task_mismatch_is_validation_error() {
    let conn = open_db_in_memory().unwrap();
    let r = repos(&conn);

    let a = r.projects.create_project(&NewProject::named("A")).unwrap();
    let b = r.projects.create_project(&NewProject::named("B")).unwrap();
    let task_in_a = r.tasks.create_task(&NewTask::new(a.id, "T")).unwrap();

    let mut problem = NewProblem::titled("crossed");
    problem.project_id = Some(b.id);
    problem.task_id = Some(task_in_a.id);
    let err = r.problems.create_problem(&problem).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::ProjectTaskMismatch { .. })
    ));

    let mut outcome = NewOutcome::new(b.id, "crossed");
    outcome.task_id = Some(task_in_a.id);
    assert_eq!(
        r.outcomes.create_outcome(&outcome).unwrap_err().kind(),
        ErrorKind::Validation
    );

    let goal = r.goals.create_goal(&NewGoal::titled("G")).unwrap();
    let err = r
        .goals
        .update_goal(
            goal.id,
            &GoalPatch {
                project_id: Some(b.id),
                task_id: Some(task_in_a.id),
                ..GoalPatch::default()
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(r.goals.get_goal(goal.id).unwrap(), goal);
}

#[test]
fn patching_task_link_inherits_its_project() {
    let conn = open_db_in_memory().unwrap();
    let r = repos(&conn);

    let project = r.projects.create_project(&NewProject::named("P")).unwrap();
    let task = r.tasks.create_task(&NewTask::new(project.id, "T")).unwrap();
    let problem = r
        .problems
        .create_problem(&NewProblem::titled("floating"))
        .unwrap();

    let updated = r
        .problems
        .update_problem(
            problem.id,
            &ProblemPatch {
                task_id: Some(task.id),
                ..ProblemPatch::default()
            },
        )
        .unwrap();
    assert_eq!(updated.project_id, Some(project.id));
    assert_eq!(updated.task_id, Some(task.id));
}

#[test]
fn outcome_task_must_belong_to_owning_project() {
    let conn = open_db_in_memory().unwrap();
    let r = repos(&conn);

    let home = r.projects.create_project(&NewProject::named("home")).unwrap();
    let away = r.projects.create_project(&NewProject::named("away")).unwrap();
    let home_task = r.tasks.create_task(&NewTask::new(home.id, "T")).unwrap();
    let away_task = r.tasks.create_task(&NewTask::new(away.id, "U")).unwrap();
    let outcome = r
        .outcomes
        .create_outcome(&NewOutcome::new(home.id, "O"))
        .unwrap();

    let linked = r
        .outcomes
        .update_outcome(
            outcome.id,
            &OutcomePatch {
                task_id: Some(home_task.id),
                ..OutcomePatch::default()
            },
        )
        .unwrap();
    assert_eq!(linked.task_id, Some(home_task.id));

    let err = r
        .outcomes
        .update_outcome(
            outcome.id,
            &OutcomePatch {
                task_id: Some(away_task.id),
                ..OutcomePatch::default()
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(r.outcomes.get_outcome(outcome.id).unwrap(), linked);
}
