use pretty_assertions::assert_eq;

use tempora_core::config::ClockMode;
use tempora_core::{NodeKind, TemporaError, TimeFilter};
use tempora_engine::{DocumentTree, Engine, NodeSet, RenderOptions, TreeNode};
use tempora_test::fixtures::BOOKS;
use tempora_test::{
    assert_order_complete, namespaced_catalog, three_book_catalog, Result, TestEngine,
    TestEnvironment,
};

fn small_tree() -> DocumentTree {
    DocumentTree::new("small", TreeNode::element("a").with_child(TreeNode::leaf("b", "x")))
}

#[test]
fn test_load_summary_and_snapshot() -> Result<()> {
    let t = TestEngine::catalog()?;
    assert_eq!(t.loaded.nodes, 1 + 3 * 11);
    assert_eq!(t.loaded.depth, 4);
    assert_eq!(t.loaded.cut, t.now()?);

    let expected = format!(
        "<catalog>{}{}{}</catalog>",
        BOOKS[0].markup(),
        BOOKS[1].markup(),
        BOOKS[2].markup()
    );
    assert_eq!(t.render_document_at(t.now()?)?, expected);

    let mut session = t.session()?;
    let full = session.render_document(&RenderOptions::at(t.now()?))?;
    assert!(full.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<catalog>"));
    assert_order_complete(t.engine.store().view(), t.loaded.document.id)?;
    Ok(())
}

#[test]
fn test_load_rejects_duplicates_and_unknown_prefixes() -> Result<()> {
    let mut engine = Engine::in_memory()?;
    engine.load(&three_book_catalog())?;

    let err = engine.load(&three_book_catalog()).unwrap_err();
    assert!(matches!(err, TemporaError::InvalidInput(_)));

    let tree = DocumentTree::new(
        "broken",
        TreeNode::element("root").with_child(TreeNode::element("x:item")),
    );
    let err = engine.load(&tree).unwrap_err();
    assert!(matches!(err, TemporaError::UnknownNamespacePrefix(ref p) if p == "x"));

    let names: Vec<String> = engine.documents()?.into_iter().map(|d| d.name).collect();
    assert_eq!(names, vec!["catalog"]);

    let err = engine.document("broken").unwrap_err();
    assert!(matches!(err, TemporaError::UnknownDocument(_)));

    let err = engine.load(&DocumentTree::new("text", TreeNode::text("loose"))).unwrap_err();
    assert!(matches!(err, TemporaError::InvalidInput(_)));
    Ok(())
}

#[test]
fn test_namespaced_document_render() -> Result<()> {
    let t = TestEngine::with_document(&namespaced_catalog())?;
    let expected = format!(
        "<catalog xmlns=\"urn:tempora:books\" xmlns:r=\"urn:tempora:reviews\">{}{}</catalog>",
        BOOKS[0].markup(),
        BOOKS[1].markup().replace(
            "</book>",
            "<r:review r:stars=\"5\">Magical</r:review></book>"
        )
    );
    assert_eq!(t.render_document_at(t.now()?)?, expected);
    Ok(())
}

#[test]
fn test_annotated_render_marks_changed_validity() -> Result<()> {
    let mut t = TestEngine::with_document(&small_tree())?;
    let root = t.root()?;
    t.engine.insert_node(&t.document, &root, "c", Some("y"), None)?;
    let now = t.now()?;

    let mut session = t.session()?;
    let rendered = session.render_document(&RenderOptions::at(now).annotated())?;
    assert_eq!(
        rendered,
        "<a xmlns:t=\"urn:tempora:validity\" t:id=\"1\" t:from=\"1\" t:to=\"now\">\
         <b>x</b><c t:id=\"4\" t:from=\"2\" t:to=\"now\">y</c></a>"
    );

    let indented = session.render_document(&RenderOptions::at(now).with_indent(2))?;
    assert_eq!(indented, "<a>\n  <b>x</b>\n  <c>y</c>\n</a>");
    Ok(())
}

#[test]
fn test_render_escapes_values() -> Result<()> {
    let tree = DocumentTree::new(
        "escape",
        TreeNode::element("a")
            .with_attribute("q", "say \"hi\" & <go>")
            .with_text("1 < 2 & 3 > 2"),
    );
    let t = TestEngine::with_document(&tree)?;
    assert_eq!(
        t.render_document_at(t.now()?)?,
        "<a q=\"say &quot;hi&quot; &amp; &lt;go&gt;\">1 &lt; 2 &amp; 3 &gt; 2</a>"
    );
    Ok(())
}

#[test]
fn test_lookups_by_label_depth_and_history() -> Result<()> {
    let mut t = TestEngine::catalog()?;
    let loaded_at = t.now()?;
    let book = t.book(1)?;
    t.engine.delete_subtree(&t.document, &book)?;
    let now = t.now()?;

    let mut session = t.session()?;
    let titles = session.nodes_by_label("title", Some(NodeKind::Element), TimeFilter::At(now))?;
    assert_eq!(titles.len(), 2);
    let ever = session.nodes_by_label("title", None, TimeFilter::All)?;
    assert_eq!(ever.len(), 3);
    let langs = session.nodes_by_label("lang", Some(NodeKind::Attribute), TimeFilter::At(loaded_at))?;
    assert_eq!(langs.len(), 3);

    let books = session.nodes_at_depth(2, TimeFilter::At(now))?;
    assert_eq!(books.len(), 2);
    assert!(!books.contains_node(book.id()));
    let class = books[0].class_id();
    assert_eq!(session.nodes_by_class(class, TimeFilter::All)?.len(), 3);

    let history = session.history(book.id())?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].valid().to, loaded_at);

    let roots = session.roots(TimeFilter::All)?;
    assert_eq!(roots.len(), 1);
    assert_eq!(session.parent(&roots[0])?, None);
    assert_eq!(session.parent(&books[0])?, Some(roots[0].clone()));
    Ok(())
}

#[test]
fn test_expired_nodes_reports_subtree_tops() -> Result<()> {
    let mut t = TestEngine::catalog()?;
    let book = t.book(1)?;
    let loaded_at = t.now()?;
    let year = t.elements_at(&book, "year", loaded_at)?.remove(0);
    let price = t.elements_at(&book, "price", loaded_at)?.remove(0);
    let mut session = t.session()?;
    let price_text = session.children_at(&price, loaded_at)?.into_vec().remove(0);
    drop(session);

    t.engine.delete_subtree(&t.document, &year)?;
    t.engine.replace_value(&t.document, &price_text, "31.00")?;
    let now = t.now()?;

    let mut session = t.session()?;
    assert!(session.expired_nodes(loaded_at)?.is_empty());

    let mut expired = session.expired_nodes(now)?.ids();
    expired.sort();
    let mut expected = vec![year.id(), price_text.id()];
    expected.sort();
    assert_eq!(expired, expected);
    Ok(())
}

#[test]
fn test_node_set_navigation() -> Result<()> {
    let t = TestEngine::catalog()?;
    let now = t.now()?;
    let mut session = t.session()?;
    let books = NodeSet::from(t.books()?);

    let attributes = books.attributes(&mut session)?;
    assert_eq!(attributes.len(), 3);
    assert!(attributes.iter().all(|a| a.kind() == NodeKind::Attribute));

    let children = books.children(&mut session)?;
    assert_eq!(children.len(), 12);
    let authors = children.filter(|n| n.local_name() == "author");
    assert_eq!(authors.len(), 3);

    let below = books.descendants(&mut session, Some(now))?;
    assert_eq!(below.len(), 3 * 10);
    assert_eq!(below.of_kind(NodeKind::Text).len(), 3 * 4);

    let sorted = below.of_kind(NodeKind::Text).sorted(&mut session)?;
    let values: Vec<&str> = sorted.iter().filter_map(|n| n.value()).take(4).collect();
    assert_eq!(
        values,
        vec![BOOKS[0].title, BOOKS[0].author, BOOKS[0].year, BOOKS[0].price]
    );

    let rendered = NodeSet::from(vec![books[1].clone()])
        .render(&mut session, &RenderOptions::at(now))?;
    assert_eq!(rendered, BOOKS[1].markup());
    assert!(!session.cache().is_empty());
    Ok(())
}

#[test]
fn test_file_backed_engine_reopens() -> Result<()> {
    let env = TestEnvironment::new()?;
    let before = {
        let mut engine = env.engine()?;
        engine.load(&three_book_catalog())?;
        let mut session = engine.session("catalog")?;
        session.render_document(&RenderOptions::at(engine.current_cut("catalog")?))?
    };
    assert!(env.database_path().exists());

    let engine = env.engine()?;
    assert_eq!(engine.current_cut("catalog")?.value(), 1);
    let mut session = engine.session("catalog")?;
    let after = session.render_document(&RenderOptions::at(engine.current_cut("catalog")?))?;
    assert_eq!(after, before);
    Ok(())
}

#[test]
fn test_wall_clock_cuts_follow_time() -> Result<()> {
    let env = TestEnvironment::with_clock(ClockMode::Wall)?;
    let mut engine = env.engine()?;
    let loaded = engine.load(&small_tree())?;
    assert!(loaded.cut.value() > 1_600_000_000_000);

    let mut session = engine.session("small")?;
    let root = session.root_at(loaded.cut)?.expect("root");
    drop(session);
    let inserted = engine.insert_node("small", &root, "c", None, None)?;
    assert!(inserted.valid().from > loaded.cut);
    Ok(())
}

#[test]
fn test_demo_catalog_matches_fixture() -> Result<()> {
    let tree = DocumentTree::from_json(include_str!("../../demos/catalog.json"))?;
    let demo = TestEngine::with_document(&tree)?;
    let fixture = TestEngine::catalog()?;
    assert_eq!(demo.loaded.nodes, fixture.loaded.nodes);
    assert_eq!(
        demo.render_document_at(demo.now()?)?,
        fixture.render_document_at(fixture.now()?)?
    );
    Ok(())
}
