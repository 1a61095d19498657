//! End-to-end tests for the parsing pipeline
//!
//! These tests feed complete AML documents through walking, extraction and
//! resolution and check the resulting graph or the reported diagnostics.

use amlgraph_core::{
    attribute::HasAttributes,
    entity::{GroupHandle, Position},
    graph::{Direction, Graph},
    identifier::SourceId,
};

use crate::{ParseConfig, ParseError, error::ErrorCode, parse_str};

// ===================
// Document builders
// ===================

fn document(root_body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<AML>
    <Header-Info CreateTime="12:00:00" CreateDate="01.01.2024"/>
    <Language LocaleId="1033"/>
    <Group Group.ID="Group.Root">
        <AttrDef AttrDef.Type="AT_DESC"><AttrValue>Database root</AttrValue></AttrDef>
        {root_body}
    </Group>
    <FFTextDef FFTextDef.ID="FFTextDef.1"/>
</AML>"#
    )
}

fn name_attr(name: &str) -> String {
    format!(r#"<AttrDef AttrDef.Type="AT_NAME"><AttrValue>{name}</AttrValue></AttrDef>"#)
}

fn group(id: &str, name: &str, body: &str) -> String {
    format!(
        r#"<Group Group.ID="{id}"><GUID>guid-{id}</GUID>{}{body}</Group>"#,
        name_attr(name)
    )
}

fn object_definition(id: &str, name: &str, linked: &str, body: &str) -> String {
    format!(
        r#"<ObjDef ObjDef.ID="{id}" TypeNum="OT_FUNC" SymbolNum="ST_FUNC" LinkedModels.IdRefs="{linked}">
            <GUID>guid-{id}</GUID>{}{body}
        </ObjDef>"#,
        name_attr(name)
    )
}

fn connection_definition(id: &str, type_code: &str, target: Option<&str>) -> String {
    let target = target
        .map(|target| format!(r#" ToObjDef.IdRef="{target}""#))
        .unwrap_or_default();
    format!(r#"<CxnDef CxnDef.ID="{id}" CxnDef.Type="{type_code}"{target}><GUID>guid-{id}</GUID></CxnDef>"#)
}

fn model(id: &str, name: &str, model_type: &str, body: &str) -> String {
    format!(
        r#"<Model Model.ID="{id}" Model.Type="{model_type}"><GUID>guid-{id}</GUID>{}{body}</Model>"#,
        name_attr(name)
    )
}

fn occurrence(id: &str, definition: &str, symbol: &str, x: i64, body: &str) -> String {
    format!(
        r#"<ObjOcc ObjOcc.ID="{id}" ObjDef.IdRef="{definition}" SymbolNum="{symbol}">
            <Position Pos.X="{x}" Pos.Y="10"/>{body}
        </ObjOcc>"#
    )
}

fn connection_occurrence(id: &str, definition: &str, target: &str) -> String {
    format!(r#"<CxnOcc CxnOcc.ID="{id}" CxnDef.IdRef="{definition}" ToObjOcc.IdRef="{target}"/>"#)
}

// ===================
// Helpers
// ===================

fn parse_source(source: &str) -> Result<Graph, ParseError> {
    parse_str(source, &ParseConfig::default())
}

/// Parse a source string and panic with the diagnostics on failure
fn assert_parses_successfully(source: &str) -> Graph {
    match parse_source(source) {
        Ok(graph) => graph,
        Err(err) => panic!("Expected parsing to succeed, but got error: {err}"),
    }
}

/// Parse a source string and return the error codes it reported
fn assert_parse_fails(source: &str) -> Vec<ErrorCode> {
    match parse_source(source) {
        Ok(_) => panic!("Expected parsing to fail, but it succeeded"),
        Err(err) => err
            .diagnostics()
            .iter()
            .filter_map(|diag| diag.code())
            .collect(),
    }
}

fn group_by_id(graph: &Graph, id: &str) -> GroupHandle {
    graph
        .groups()
        .lookup(SourceId::new(id))
        .unwrap_or_else(|| panic!("group `{id}` not found"))
}

// ===================
// Scenarios
// ===================

#[test]
fn test_finance_group_with_linked_model() {
    let finance = group(
        "Group.1",
        "Finance",
        &format!(
            "{}{}",
            object_definition("ObjDef.D1", "Invoice", "Model.M1", ""),
            model("Model.M1", "Billing", "MT_FUNC_ALLOC_DGM", "")
        ),
    );
    let graph = assert_parses_successfully(&document(&finance));

    let definitions = graph.object_definitions();
    let models = graph.models();
    let d1 = definitions.lookup(SourceId::new("ObjDef.D1")).unwrap();
    let m1 = models.lookup(SourceId::new("Model.M1")).unwrap();

    assert_eq!(definitions[d1].name, "Invoice");
    assert_eq!(definitions[d1].linked_models, vec![m1]);
    assert_eq!(definitions[d1].path, "./Finance");
    assert_eq!(models[m1].path, "./Finance");
    assert_eq!(models[m1].name, "Billing");
    assert_eq!(models[m1].superior, Some(d1));

    let g1 = group_by_id(&graph, "Group.1");
    assert_eq!(graph.groups()[g1].object_definitions, vec![d1]);
    assert_eq!(graph.groups()[g1].models, vec![m1]);
    assert_eq!(definitions[d1].group, g1);
}

#[test]
fn test_root_group_is_synthesized() {
    let graph = assert_parses_successfully(&document(&group("Group.1", "Finance", "")));

    let root = &graph.groups()[graph.root()];
    assert_eq!(root.source_id, SourceId::new("Group.Root"));
    assert_eq!(root.name, ".");
    assert_eq!(root.path, ".");
    assert_eq!(root.level, 0);
    assert!(root.guid.is_none());
    assert!(root.is_root());
    assert_eq!(root.attribute("AT_DESC"), Some("Database root"));
    assert!(root.has_children());

    let child = &graph.groups()[group_by_id(&graph, "Group.1")];
    assert_eq!(child.parent, Some(graph.root()));
    assert_eq!(child.guid.as_deref(), Some("guid-Group.1"));
    assert!(!child.has_children());
}

#[test]
fn test_root_sentinel_replaces_document_id() {
    let source = r#"<AML><Group Group.ID="G0"><Group Group.ID="G1"><GUID>g1</GUID></Group></Group></AML>"#;
    let graph = assert_parses_successfully(source);

    assert_eq!(graph.groups()[graph.root()].source_id, SourceId::new("Group.Root"));
    assert!(graph.groups().lookup(SourceId::new("G0")).is_none());
    let g1 = group_by_id(&graph, "G1");
    assert_eq!(graph.groups()[g1].parent, Some(graph.root()));
    assert_eq!(graph.groups()[g1].path, "./");
}

#[test]
fn test_nested_group_paths_and_levels() {
    let tree = group(
        "Group.A",
        "Finance",
        &format!(
            "{}{}",
            group(
                "Group.B",
                "Billing",
                &group(
                    "Group.C",
                    "Archive",
                    &object_definition("ObjDef.Deep", "Deep", "", "")
                )
            ),
            object_definition("ObjDef.Late", "Late", "", "")
        ),
    );
    let graph = assert_parses_successfully(&document(&tree));

    let c = group_by_id(&graph, "Group.C");
    assert_eq!(graph.groups()[c].path, "./Finance/Billing/Archive");
    assert_eq!(graph.groups()[c].level, 3);
    assert_eq!(graph.ancestors(c).count(), 3);

    let definitions = graph.object_definitions();
    let deep = definitions.lookup(SourceId::new("ObjDef.Deep")).unwrap();
    let late = definitions.lookup(SourceId::new("ObjDef.Late")).unwrap();
    assert_eq!(definitions[deep].path, "./Finance/Billing/Archive");
    assert_eq!(definitions[late].path, "./Finance");

    let a = group_by_id(&graph, "Group.A");
    let b = group_by_id(&graph, "Group.B");
    assert_eq!(graph.groups()[a].children, vec![b]);
    assert_eq!(graph.groups()[b].children, vec![c]);
}

#[test]
fn test_occurrence_connections_by_direction() {
    let definitions = format!(
        "{}{}",
        object_definition(
            "ObjDef.1",
            "Invoice",
            "",
            &connection_definition("CxnDef.1", "is input for", Some("ObjDef.2"))
        ),
        object_definition("ObjDef.2", "Payment", "", "")
    );
    let occurrences = format!(
        "{}{}",
        occurrence(
            "ObjOcc.O1",
            "ObjDef.1",
            "ST_FUNC",
            0,
            &connection_occurrence("CxnOcc.C1", "CxnDef.1", "ObjOcc.O2")
        ),
        occurrence("ObjOcc.O2", "ObjDef.2", "ST_EV", 100, "")
    );
    let body = format!("{definitions}{}", model("Model.1", "Flow", "MT_EEPC", &occurrences));
    let graph = assert_parses_successfully(&document(&body));

    let occs = graph.object_occurrences();
    let o1 = occs.lookup(SourceId::new("ObjOcc.O1")).unwrap();
    let o2 = occs.lookup(SourceId::new("ObjOcc.O2")).unwrap();
    let types = ["is input for"];

    assert_eq!(graph.connected_occurrences(o1, &types, &[], Direction::Out), vec![o2]);
    assert_eq!(graph.connected_occurrences(o2, &types, &[], Direction::In), vec![o1]);
    assert_eq!(graph.connected_occurrences(o1, &types, &[], Direction::Both), vec![o2]);
    assert_eq!(graph.connected_occurrences(o2, &types, &[], Direction::Both), vec![o1]);
    assert!(graph.connected_occurrences(o2, &types, &[], Direction::Out).is_empty());

    assert_eq!(graph.occurrence_name(o2), "Payment");
    assert_eq!(occs[o2].position, Position { x: 100, y: 10 });

    let m1 = graph.models().lookup(SourceId::new("Model.1")).unwrap();
    assert_eq!(graph.models()[m1].occurrences, vec![o1, o2]);

    let c1 = graph
        .connection_occurrences()
        .lookup(SourceId::new("CxnOcc.C1"))
        .unwrap();
    let cd1 = graph
        .connection_definitions()
        .lookup(SourceId::new("CxnDef.1"))
        .unwrap();
    assert_eq!(graph.connection_definitions()[cd1].occurrences, vec![c1]);
    assert_eq!(occs[o1].connections, vec![c1]);
}

#[test]
fn test_connection_definition_without_target() {
    let body = object_definition(
        "ObjDef.1",
        "Invoice",
        "",
        &connection_definition("CxnDef.Open", "CT_ASSIGN", None),
    );
    let graph = assert_parses_successfully(&document(&body));

    let cxn = graph
        .connection_definitions()
        .lookup(SourceId::new("CxnDef.Open"))
        .unwrap();
    let definition = graph
        .object_definitions()
        .lookup(SourceId::new("ObjDef.1"))
        .unwrap();
    assert_eq!(graph.connection_definitions()[cxn].target, None);
    assert_eq!(graph.connection_definitions()[cxn].source, definition);
    assert_eq!(graph.object_definitions()[definition].connections, vec![cxn]);
}

#[test]
fn test_connection_definition_with_unknown_target() {
    let body = object_definition(
        "ObjDef.1",
        "Invoice",
        "",
        &connection_definition("CxnDef.Bad", "CT_ASSIGN", Some("ObjDef.Missing")),
    );

    assert_eq!(assert_parse_fails(&document(&body)), [ErrorCode::E201]);
}

#[test]
fn test_all_dangling_references_are_reported() {
    let occurrences = occurrence(
        "ObjOcc.1",
        "ObjDef.Ghost",
        "ST_FUNC",
        0,
        &connection_occurrence("CxnOcc.1", "CxnDef.Ghost", "ObjOcc.Ghost"),
    );
    let body = format!(
        "{}{}",
        object_definition("ObjDef.1", "Invoice", "Model.Ghost", ""),
        model("Model.1", "Flow", "MT_EEPC", &occurrences)
    );

    let err = parse_source(&document(&body)).unwrap_err();
    let codes: Vec<_> = err.diagnostics().iter().filter_map(|d| d.code()).collect();

    assert_eq!(
        codes,
        [ErrorCode::E201, ErrorCode::E202, ErrorCode::E204, ErrorCode::E203]
    );
    assert!(err.diagnostics().iter().all(|d| d.offset().is_some()));
    assert!(err.diagnostics()[0].message().contains("ObjDef.Ghost"));
    assert!(err.to_string().ends_with("(+3 more)"));
}

#[test]
fn test_repeated_definition_merges_links() {
    let body = format!(
        "{}{}{}",
        group(
            "Group.1",
            "First",
            &object_definition("ObjDef.Shared", "Old name", "Model.1 Model.2", "")
        ),
        group(
            "Group.2",
            "Second",
            &object_definition("ObjDef.Shared", "New name", "Model.2  Model.3", "")
        ),
        format!(
            "{}{}{}",
            model("Model.1", "One", "MT_EEPC", ""),
            model("Model.2", "Two", "MT_EEPC", ""),
            model("Model.3", "Three", "MT_EEPC", "")
        )
    );
    let graph = assert_parses_successfully(&document(&body));

    let definitions = graph.object_definitions();
    assert_eq!(definitions.len(), 1);
    let shared = definitions.lookup(SourceId::new("ObjDef.Shared")).unwrap();
    assert_eq!(definitions[shared].name, "New name");
    assert_eq!(definitions[shared].path, "./Second");
    assert_eq!(definitions[shared].group, group_by_id(&graph, "Group.2"));

    let linked: Vec<_> = definitions[shared]
        .linked_models
        .iter()
        .map(|&model| graph.models()[model].name.as_str())
        .collect();
    assert_eq!(linked, ["One", "Two", "Three"]);
}

#[test]
fn test_repeated_model_keeps_only_latest_occurrences() {
    let definitions = format!(
        "{}{}",
        object_definition(
            "ObjDef.1",
            "Invoice",
            "",
            &connection_definition("CxnDef.1", "is input for", Some("ObjDef.1"))
        ),
        object_definition("ObjDef.2", "Payment", "", "")
    );
    let first = model(
        "Model.M1",
        "Draft",
        "MT_EEPC",
        &occurrence(
            "ObjOcc.OA",
            "ObjDef.1",
            "ST_FUNC",
            0,
            &connection_occurrence("CxnOcc.CA", "CxnDef.1", "ObjOcc.OA"),
        ),
    );
    let second = model(
        "Model.M1",
        "Final",
        "MT_EEPC",
        &occurrence("ObjOcc.OB", "ObjDef.2", "ST_EV", 50, ""),
    );
    let body = format!(
        "{definitions}{}{}",
        group("Group.G1", "Drafts", &first),
        group("Group.G2", "Finals", &second)
    );
    let graph = assert_parses_successfully(&document(&body));

    assert_eq!(graph.models().len(), 1);
    let m1 = graph.models().lookup(SourceId::new("Model.M1")).unwrap();
    assert_eq!(graph.models()[m1].name, "Final");

    let ob = graph
        .object_occurrences()
        .lookup(SourceId::new("ObjOcc.OB"))
        .unwrap();
    assert_eq!(graph.models()[m1].occurrences, vec![ob]);

    let placed: Vec<_> = graph
        .object_occurrences()
        .iter()
        .filter(|(_, occurrence)| occurrence.model == m1)
        .map(|(handle, _)| handle)
        .collect();
    assert_eq!(placed, vec![ob]);
    assert!(graph.object_occurrences().lookup(SourceId::new("ObjOcc.OA")).is_none());
    assert!(graph.connection_occurrences().is_empty());
}

#[test]
fn test_superior_is_last_linking_definition() {
    let body = format!(
        "{}{}{}",
        object_definition("ObjDef.A", "A", "Model.1", ""),
        object_definition("ObjDef.B", "B", "Model.1", ""),
        model("Model.1", "Shared", "MT_EEPC", "")
    );
    let graph = assert_parses_successfully(&document(&body));

    let model = graph.models().lookup(SourceId::new("Model.1")).unwrap();
    let b = graph
        .object_definitions()
        .lookup(SourceId::new("ObjDef.B"))
        .unwrap();
    assert_eq!(graph.models()[model].superior, Some(b));
}

#[test]
fn test_elements_outside_root_are_ignored() {
    let source = r#"<AML>
        <Model Model.ID="Model.Outside" Model.Type="MT_EEPC"/>
        <Group Group.ID="Group.Root"/>
        <ObjDef ObjDef.ID="ObjDef.Outside"/>
    </AML>"#;
    let graph = assert_parses_successfully(source);

    assert_eq!(graph.groups().len(), 1);
    assert!(graph.models().is_empty());
    assert!(graph.object_definitions().is_empty());
}

// ===================
// Structural errors
// ===================

#[test]
fn test_second_top_level_group_fails() {
    let source = r#"<AML><Group Group.ID="Group.Root"/><Group Group.ID="Group.2"/></AML>"#;
    assert_eq!(assert_parse_fails(source), [ErrorCode::E005]);
}

#[test]
fn test_document_without_groups_fails() {
    assert_eq!(assert_parse_fails("<AML><Language/></AML>"), [ErrorCode::E004]);
}

#[test]
fn test_truncated_document_fails() {
    let source = r#"<AML><Group Group.ID="Group.Root"><Group Group.ID="Group.1">"#;
    assert_eq!(assert_parse_fails(source), [ErrorCode::E003]);
}

#[test]
fn test_malformed_document_fails() {
    let source = r#"<AML><Group Group.ID="Group.Root"></Model></AML>"#;
    assert_eq!(assert_parse_fails(source), [ErrorCode::E001]);
}

#[test]
fn test_nested_group_with_root_id_fails() {
    let source = document(r#"<Group Group.ID="Group.Root"><GUID>x</GUID></Group>"#);
    assert_eq!(assert_parse_fails(&source), [ErrorCode::E006]);
}

#[test]
fn test_nested_group_without_id_fails() {
    let source = document("<Group><GUID>x</GUID></Group>");
    assert_eq!(assert_parse_fails(&source), [ErrorCode::E100]);
}

#[test]
fn test_duplicate_group_ids_breaking_hierarchy_fail() {
    let body = group("Group.X", "Outer", &group("Group.Y", "Inner", &group("Group.X", "Again", "")));
    let codes = assert_parse_fails(&document(&body));

    assert!(!codes.is_empty());
    assert!(codes.iter().all(|code| *code == ErrorCode::E007));
}

#[test]
fn test_model_without_guid_fails() {
    let source = document(r#"<Model Model.ID="Model.1" Model.Type="MT_EEPC"/>"#);
    assert_eq!(assert_parse_fails(&source), [ErrorCode::E101]);
}

#[test]
fn test_custom_name_attribute_and_root_id() {
    let config = ParseConfig::new("AT_TITLE", "Root");
    let source = r#"<AML><Group Group.ID="G0">
        <Group Group.ID="G1">
            <AttrDef AttrDef.Type="AT_TITLE"><AttrValue>Titled</AttrValue></AttrDef>
            <AttrDef AttrDef.Type="AT_NAME"><AttrValue>Kept</AttrValue></AttrDef>
        </Group>
    </Group></AML>"#;
    let graph = parse_str(source, &config).expect("custom config should parse");

    assert_eq!(graph.groups()[graph.root()].source_id, SourceId::new("Root"));
    let g1 = &graph.groups()[group_by_id(&graph, "G1")];
    assert_eq!(g1.name, "Titled");
    assert_eq!(g1.attribute("AT_NAME"), Some("Kept"));
}

mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    /// Strategy for random group trees.
    ///
    /// Entry `i` picks the parent of group `i + 1` among the groups before it;
    /// group 0 is the root.
    fn group_tree_strategy() -> impl Strategy<Value = Vec<usize>> {
        prop::collection::vec(any::<usize>(), 0..40).prop_map(|picks| {
            picks
                .iter()
                .enumerate()
                .map(|(index, pick)| pick % (index + 1))
                .collect()
        })
    }

    /// Strategy for the linked-model lists of one definition seen in several groups.
    fn link_lists_strategy() -> impl Strategy<Value = Vec<Vec<usize>>> {
        prop::collection::vec(prop::collection::vec(0usize..6, 0..5), 1..5)
    }

    fn render_group(index: usize, children: &[Vec<usize>]) -> String {
        let body: String = children[index]
            .iter()
            .map(|&child| render_group(child, children))
            .collect();
        if index == 0 {
            body
        } else {
            group(&format!("Group.P{index}"), &format!("g{index}"), &body)
        }
    }

    // ===================
    // Property Test Functions
    // ===================

    /// Every group reaches the single root in exactly `level` steps.
    fn check_group_levels(parents: &[usize]) -> Result<(), TestCaseError> {
        let mut children = vec![Vec::new(); parents.len() + 1];
        for (index, &parent) in parents.iter().enumerate() {
            children[parent].push(index + 1);
        }
        let graph = parse_source(&document(&render_group(0, &children)))
            .map_err(|err| TestCaseError::fail(err.to_string()))?;

        let groups = graph.groups();
        prop_assert_eq!(groups.len(), parents.len() + 1);
        let roots: Vec<_> = groups.iter().filter(|(_, group)| group.is_root()).collect();
        prop_assert_eq!(roots.len(), 1);
        prop_assert_eq!(roots[0].0, graph.root());

        for (handle, group) in groups.iter() {
            let ancestors: Vec<_> = graph.ancestors(handle).collect();
            prop_assert_eq!(ancestors.len(), group.level);
            if handle != graph.root() {
                prop_assert_eq!(ancestors.last().copied(), Some(graph.root()));
            }
            prop_assert_eq!(group.path.split('/').count(), group.level + 1);
        }
        Ok(())
    }

    /// A definition seen in several groups links the union of all its lists.
    fn check_linked_models_union(lists: &[Vec<usize>]) -> Result<(), TestCaseError> {
        let groups: String = lists
            .iter()
            .enumerate()
            .map(|(index, list)| {
                let linked: Vec<_> = list.iter().map(|model| format!("Model.U{model}")).collect();
                group(
                    &format!("Group.U{index}"),
                    &format!("u{index}"),
                    &object_definition("ObjDef.U", "Shared", &linked.join(" "), ""),
                )
            })
            .collect();
        let models: String = (0..6)
            .map(|model| super::model(&format!("Model.U{model}"), "m", "MT_EEPC", ""))
            .collect();
        let graph = parse_source(&document(&format!("{groups}{models}")))
            .map_err(|err| TestCaseError::fail(err.to_string()))?;

        let mut expected = Vec::new();
        for model in lists.iter().flatten() {
            let id = SourceId::new(&format!("Model.U{model}"));
            if !expected.contains(&id) {
                expected.push(id);
            }
        }

        let definition = graph
            .object_definitions()
            .lookup(SourceId::new("ObjDef.U"))
            .ok_or_else(|| TestCaseError::fail("definition missing"))?;
        let linked: Vec<_> = graph.object_definitions()[definition]
            .linked_models
            .iter()
            .map(|&model| graph.models()[model].source_id)
            .collect();
        prop_assert_eq!(linked, expected);
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn group_levels_match_parent_chains(parents in group_tree_strategy()) {
            check_group_levels(&parents)?;
        }

        #[test]
        fn linked_models_are_unioned(lists in link_lists_strategy()) {
            check_linked_models_union(&lists)?;
        }
    }
}
