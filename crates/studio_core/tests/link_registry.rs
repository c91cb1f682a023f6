use rusqlite::Connection;
use studio_core::db::{open_db, open_db_in_memory};
use studio_core::{
    Agent, AgentConfig, AgentType, EntityId, EntityKind, EntityStore, ErrorKind, Filters,
    LinkKind, LinkRegistry, LinkedEntities, LlmModel, ModelProvider, Skill,
    SqliteEntityRepository, SqliteLinkRepository, Workflow, WorkflowType,
};

fn store(conn: &Connection) -> EntityStore<SqliteEntityRepository<'_>> {
    EntityStore::new(SqliteEntityRepository::try_new(conn).unwrap())
}

fn registry(conn: &Connection) -> LinkRegistry<SqliteLinkRepository<'_>> {
    LinkRegistry::new(SqliteLinkRepository::try_new(conn).unwrap())
}

fn create_agent(conn: &Connection, name: &str) -> EntityId {
    store(conn)
        .upsert(&Agent::new(AgentType::Assistant, AgentConfig::named(name)))
        .data
        .unwrap()
        .id
        .unwrap()
}

fn create_model_with_id(conn: &Connection, id: EntityId, model: &str) -> EntityId {
    let mut entity = LlmModel::new(ModelProvider::Openai, model);
    entity.id = Some(id);
    store(conn).upsert(&entity).data.unwrap().id.unwrap()
}

fn create_skill(conn: &Connection, name: &str) -> EntityId {
    store(conn)
        .upsert(&Skill::new(name, "def run():\n    return 1"))
        .data
        .unwrap()
        .id
        .unwrap()
}

fn create_entity(conn: &Connection, kind: EntityKind, name: &str) -> EntityId {
    match kind {
        EntityKind::Agent => create_agent(conn, name),
        EntityKind::Model => store(conn)
            .upsert(&LlmModel::new(ModelProvider::Groq, name))
            .data
            .unwrap()
            .id
            .unwrap(),
        EntityKind::Skill => create_skill(conn, name),
        EntityKind::Workflow => store(conn)
            .upsert(&Workflow::new(name, WorkflowType::Autonomous))
            .data
            .unwrap()
            .id
            .unwrap(),
    }
}

#[test]
fn agent_model_example_round_trips_with_hyphen_tag() {
    let conn = open_db_in_memory().unwrap();
    let mut agent = Agent::new(AgentType::Assistant, AgentConfig::named("assistant"));
    agent.id = Some(1);
    assert!(store(&conn).upsert(&agent).status);
    create_model_with_id(&conn, 5, "gpt-4o");
    let registry = registry(&conn);

    let linked = registry.link("agent-model", 1, 5);
    assert!(linked.status);
    assert!(linked.message.contains("linked"));
    let before = registry.get_linked_entities("agent-model", 1, false);
    assert!(before.status);
    assert_eq!(before.data.unwrap().ids(), vec![5]);

    assert!(registry.unlink("agent-model", 1, 5).status);
    let after = registry.get_linked_entities("agent-model", 1, false);
    assert!(after.status);
    assert!(after.data.unwrap().is_empty());
}

#[test]
fn every_kind_follows_link_duplicate_unlink_lifecycle() {
    let conn = open_db_in_memory().unwrap();
    let registry = registry(&conn);

    for kind in LinkKind::ALL {
        let tag = kind.as_str().replace('_', "-");
        let primary = create_entity(&conn, kind.primary(), &format!("{tag}_primary"));
        let secondary = create_entity(&conn, kind.secondary(), &format!("{tag}_secondary"));

        assert!(registry.link(&tag, primary, secondary).status, "{tag}");
        let duplicate = registry.link(&tag, primary, secondary);
        assert_eq!(duplicate.error, Some(ErrorKind::DuplicateLink), "{tag}");
        assert_eq!(registry.count_links(kind).unwrap(), 1, "{tag}");
        assert_eq!(
            registry
                .get_linked_entities(&tag, primary, false)
                .data
                .unwrap()
                .ids(),
            vec![secondary],
            "{tag}"
        );

        assert!(registry.unlink(&tag, primary, secondary).status, "{tag}");
        let again = registry.unlink(&tag, primary, secondary);
        assert_eq!(again.error, Some(ErrorKind::LinkNotFound), "{tag}");

        let after = registry.get_linked_entities(&tag, primary, false);
        assert!(after.status, "{tag}");
        assert!(after.data.unwrap().is_empty(), "{tag}");
        assert_eq!(registry.count_links(kind).unwrap(), 0, "{tag}");
    }
}

#[test]
fn unlink_with_missing_endpoint_reports_entity_not_found() {
    let conn = open_db_in_memory().unwrap();
    let agent_id = create_agent(&conn, "planner");
    let model_id = create_model_with_id(&conn, 5, "gpt-4o");
    let registry = registry(&conn);
    assert!(registry.link("agent_model", agent_id, model_id).status);

    let missing_primary = registry.unlink("agent_model", 999, model_id);
    assert!(!missing_primary.status);
    assert_eq!(missing_primary.error, Some(ErrorKind::EntityNotFound));
    assert!(missing_primary.message.contains("Agent 999 not found"));

    let missing_secondary = registry.unlink("agent_model", agent_id, 999);
    assert_eq!(missing_secondary.error, Some(ErrorKind::EntityNotFound));
    assert!(missing_secondary.message.contains("Model 999 not found"));

    assert_eq!(registry.count_links(LinkKind::AgentModel).unwrap(), 1);
}

#[test]
fn link_then_query_returns_typed_secondaries() {
    let conn = open_db_in_memory().unwrap();
    let agent_id = create_agent(&conn, "planner");
    let model_id = create_model_with_id(&conn, 5, "gpt-4o");
    let registry = registry(&conn);

    let linked = registry.link("agent_model", agent_id, model_id);
    assert!(linked.status);
    assert_eq!(linked.message, "Model successfully linked to Agent");

    let response = registry.get_linked_entities("agent_model", agent_id, false);
    assert!(response.status);
    match response.data.unwrap() {
        LinkedEntities::Models(models) => {
            assert_eq!(models.len(), 1);
            assert_eq!(models[0].id, Some(5));
            assert_eq!(models[0].model, "gpt-4o");
        }
        other => panic!("unexpected collection: {other:?}"),
    }
}

#[test]
fn duplicate_link_is_rejected_without_second_row() {
    let conn = open_db_in_memory().unwrap();
    let agent_id = create_agent(&conn, "planner");
    let model_id = create_model_with_id(&conn, 5, "gpt-4o");
    let registry = registry(&conn);

    assert!(registry.link("agent_model", agent_id, model_id).status);
    let second = registry.link("agent-model", agent_id, model_id);

    assert!(!second.status);
    assert_eq!(second.error, Some(ErrorKind::DuplicateLink));
    assert_eq!(second.message, "Model already linked to Agent");
    assert_eq!(registry.count_links(LinkKind::AgentModel).unwrap(), 1);
}

#[test]
fn link_with_missing_endpoint_creates_nothing() {
    let conn = open_db_in_memory().unwrap();
    let agent_id = create_agent(&conn, "planner");
    let registry = registry(&conn);

    let response = registry.link("agent_skill", agent_id, 404);

    assert!(!response.status);
    assert_eq!(response.error, Some(ErrorKind::EntityNotFound));
    assert!(response.message.contains("Skill 404 not found"));
    assert_eq!(registry.count_links(LinkKind::AgentSkill).unwrap(), 0);

    let missing_primary = registry.link("agent_skill", 404, agent_id);
    assert_eq!(missing_primary.error, Some(ErrorKind::EntityNotFound));
    assert!(missing_primary.message.contains("Agent 404 not found"));
}

#[test]
fn unlink_removes_existing_link_and_allows_relinking() {
    let conn = open_db_in_memory().unwrap();
    let agent_id = create_agent(&conn, "coder");
    let skill_id = create_skill(&conn, "run_tests");
    let registry = registry(&conn);

    assert!(registry.link("agent_skill", agent_id, skill_id).status);

    let removed = registry.unlink("agent_skill", agent_id, skill_id);
    assert!(removed.status);
    assert_eq!(removed.message, "Link removed successfully.");
    let after = registry.get_linked_entities("agent_skill", agent_id, false);
    assert!(after.status);
    assert!(after.data.unwrap().is_empty());

    assert!(registry.link("agent_skill", agent_id, skill_id).status);
    assert_eq!(registry.count_links(LinkKind::AgentSkill).unwrap(), 1);
}

#[test]
fn unlink_without_link_reports_not_found() {
    let conn = open_db_in_memory().unwrap();
    let agent_id = create_agent(&conn, "coder");
    let skill_id = create_skill(&conn, "run_tests");
    let registry = registry(&conn);

    let response = registry.unlink("agent_skill", agent_id, skill_id);

    assert!(!response.status);
    assert_eq!(response.error, Some(ErrorKind::LinkNotFound));
    assert_eq!(response.message, "Link does not exist.");
}

#[test]
fn invalid_kind_tag_is_rejected_for_every_operation() {
    let conn = open_db_in_memory().unwrap();
    let agent_id = create_agent(&conn, "planner");
    let registry = registry(&conn);

    let linked = registry.link("agent_workflow", agent_id, agent_id);
    assert!(!linked.status);
    assert_eq!(linked.error, Some(ErrorKind::InvalidLinkKind));
    assert!(linked
        .message
        .starts_with("Invalid link type: agent_workflow. Valid link types are:"));

    let unlinked = registry.unlink("", agent_id, agent_id);
    assert_eq!(unlinked.error, Some(ErrorKind::InvalidLinkKind));

    let queried = registry.get_linked_entities("agent_workflow", agent_id, false);
    assert!(!queried.status);
    assert_eq!(queried.error, Some(ErrorKind::InvalidLinkKind));
    assert!(queried.data.unwrap().is_empty());
}

#[test]
fn query_for_missing_primary_returns_empty_collection() {
    let conn = open_db_in_memory().unwrap();
    let registry = registry(&conn);

    let response = registry.get_linked_entities("workflow_agent", 9, true);

    assert!(!response.status);
    assert_eq!(response.error, Some(ErrorKind::EntityNotFound));
    assert!(response.data.unwrap().is_empty());
}

#[test]
fn agent_agent_links_are_directional() {
    let conn = open_db_in_memory().unwrap();
    let manager = create_agent(&conn, "group_manager");
    let worker = create_agent(&conn, "worker");
    let registry = registry(&conn);

    assert!(registry.link("agent_agent", manager, worker).status);
    assert!(registry.link("agent_agent", worker, manager).status);
    assert_eq!(registry.count_links(LinkKind::AgentAgent).unwrap(), 2);

    assert!(registry.unlink("agent_agent", worker, manager).status);
    let children = registry.get_linked_entities("agent_agent", manager, false);
    assert_eq!(children.data.unwrap().ids(), vec![worker]);
    let reverse = registry.get_linked_entities("agent_agent", worker, false);
    assert!(reverse.data.unwrap().is_empty());
}

#[test]
fn workflow_agents_come_back_in_link_order_as_plain_maps() {
    let conn = open_db_in_memory().unwrap();
    let workflow_id = store(&conn)
        .upsert(&Workflow::new("release_review", WorkflowType::Sequential))
        .data
        .unwrap()
        .id
        .unwrap();
    let reviewer = create_agent(&conn, "reviewer");
    let writer = create_agent(&conn, "writer");
    let registry = registry(&conn);

    assert!(registry.link("workflow_agent", workflow_id, writer).status);
    assert!(registry.link("workflow_agent", workflow_id, reviewer).status);

    let response = registry.get_linked_entities("workflow_agent", workflow_id, true);
    assert!(response.status);
    match response.data.unwrap() {
        LinkedEntities::Records(records) => {
            assert_eq!(records.len(), 2);
            assert_eq!(records[0]["id"], writer);
            assert_eq!(records[0]["config"]["name"], "writer");
            assert_eq!(records[1]["id"], reviewer);
            assert_eq!(records[1]["type"], "assistant");
        }
        other => panic!("unexpected collection: {other:?}"),
    }
}

#[test]
fn deleting_an_entity_cascades_to_its_links() {
    let conn = open_db_in_memory().unwrap();
    let agent_id = create_agent(&conn, "planner");
    let model_id = create_model_with_id(&conn, 5, "gpt-4o");
    let skill_id = create_skill(&conn, "search_web");
    let registry = registry(&conn);

    assert!(registry.link("agent_model", agent_id, model_id).status);
    assert!(registry.link("agent_skill", agent_id, skill_id).status);

    let deleted = store(&conn).delete(EntityKind::Model, &Filters::by_id(model_id));
    assert!(deleted.status);
    assert_eq!(registry.count_links(LinkKind::AgentModel).unwrap(), 0);
    assert_eq!(registry.count_links(LinkKind::AgentSkill).unwrap(), 1);

    assert!(store(&conn).delete(EntityKind::Agent, &Filters::new()).status);
    assert_eq!(registry.count_links(LinkKind::AgentSkill).unwrap(), 0);
}

#[test]
fn storage_failure_reports_link_failed() {
    let conn = open_db_in_memory().unwrap();
    let agent_id = create_agent(&conn, "coder");
    let skill_id = create_skill(&conn, "run_tests");
    let registry = registry(&conn);

    conn.execute_batch("DROP TABLE agent_skill_links;").unwrap();
    let response = registry.link("agent_skill", agent_id, skill_id);

    assert!(!response.status);
    assert_eq!(response.error, Some(ErrorKind::LinkFailed));
    assert!(response
        .message
        .starts_with("Error while linking due to an exception"));
}

#[test]
fn links_are_visible_across_connections_to_the_same_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("studio.db");

    let writer = open_db(&path).unwrap();
    let agent_id = create_agent(&writer, "planner");
    let model_id = create_model_with_id(&writer, 5, "gpt-4o");

    let reader = open_db(&path).unwrap();
    assert!(registry(&writer).link("agent_model", agent_id, model_id).status);

    let duplicate = registry(&reader).link("agent_model", agent_id, model_id);
    assert_eq!(duplicate.error, Some(ErrorKind::DuplicateLink));
    assert_eq!(
        registry(&reader)
            .get_linked_entities("agent_model", agent_id, false)
            .data
            .unwrap()
            .ids(),
        vec![model_id]
    );
}
