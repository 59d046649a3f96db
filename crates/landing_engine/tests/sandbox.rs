use landing_engine::{NodeHandle, RenderView, SandboxError, SandboxRenderer};
use pretty_assertions::assert_eq;

fn mounted(html: &str) -> SandboxRenderer {
    let mut renderer = SandboxRenderer::default();
    renderer.mount(html, RenderView::Preview);
    renderer
}

#[test]
fn preview_mount_reproduces_the_buffer() {
    let html = r#"<header><h1>Bakery</h1></header><main><p class="lead">Fresh bread</p></main>"#;
    let renderer = mounted(html);
    assert_eq!(renderer.read_full_markup().as_deref(), Some(html));
    assert_eq!(renderer.elements().len(), 4);
}

#[test]
fn every_preview_element_is_instrumented() {
    let renderer = mounted("<div><p>a</p><span>b</span></div>");
    for handle in renderer.elements() {
        assert!(renderer.has_click_listener(handle).unwrap());
        assert!(renderer.hover_listeners(handle).unwrap().is_some());
    }
}

#[test]
fn hovering_highlights_and_leaving_clears() {
    let mut renderer = mounted("<p>a</p>");
    let p = renderer.elements()[0];
    assert!(renderer.pointer_enter(p).unwrap());
    assert!(renderer.is_highlighted(p).unwrap());
    renderer.pointer_leave(p).unwrap();
    assert!(!renderer.is_highlighted(p).unwrap());
    assert_eq!(renderer.read_full_markup().as_deref(), Some("<p>a</p>"));
}

#[test]
fn source_view_shows_escaped_markup_without_listeners() {
    let mut renderer = SandboxRenderer::default();
    renderer.mount("<h1>Hi & bye</h1>", RenderView::Source);
    assert_eq!(
        renderer.read_full_markup().as_deref(),
        Some("<pre>&lt;h1&gt;Hi &amp; bye&lt;/h1&gt;</pre>")
    );
    let pre = renderer.elements()[0];
    assert!(!renderer.has_click_listener(pre).unwrap());
    assert_eq!(renderer.click(pre).unwrap(), None);
}

#[test]
fn remount_makes_old_handles_stale() {
    let mut renderer = mounted("<p>a</p>");
    let old = renderer.elements()[0];
    renderer.mount("<p>b</p>", RenderView::Preview);
    assert_eq!(
        renderer.inner_markup(old),
        Err(SandboxError::StaleHandle(old))
    );
    assert_eq!(renderer.elements()[0].generation(), old.generation() + 1);
}

#[test]
fn fragment_before_first_mount_is_dropped() {
    let mut renderer = SandboxRenderer::default();
    assert_eq!(renderer.append_fragment("<p>early</p>"), None);
    assert_eq!(renderer.read_full_markup(), None);

    renderer.mount("<h1>Page</h1>", RenderView::Preview);
    assert_eq!(renderer.read_full_markup().as_deref(), Some("<h1>Page</h1>"));
}

#[test]
fn fragments_append_in_delivery_order_without_touching_existing_nodes() {
    let mut renderer = mounted("<h1>Page</h1>");
    let heading = renderer.elements()[0];
    renderer.pointer_enter(heading).unwrap();

    assert_eq!(renderer.append_fragment("<section>One</section>"), Some(2));
    assert_eq!(renderer.append_fragment("<p>Two</p>"), Some(2));

    assert_eq!(
        renderer.read_full_markup().as_deref(),
        Some("<h1>Page</h1><div><section>One</section></div><div><p>Two</p></div>")
    );
    assert!(renderer.is_highlighted(heading).unwrap());
    for handle in renderer.elements() {
        assert!(renderer.has_click_listener(handle).unwrap());
    }
}

#[test]
fn click_reports_inner_markup() {
    let renderer = mounted("<div><b>bold</b> text</div>");
    let div = renderer.elements()[0];
    let event = renderer.click(div).unwrap().expect("click listener");
    assert_eq!(event.handle, div);
    assert_eq!(event.inner_markup, "<b>bold</b> text");
}

#[test]
fn set_inner_markup_replaces_children_and_reinstruments() {
    let mut renderer = mounted("<div><p>old</p></div>");
    let div = renderer.elements()[0];
    let old_child = renderer.elements()[1];

    renderer
        .set_inner_markup(div, "<span>new</span><em>x</em>")
        .unwrap();

    assert_eq!(
        renderer.read_full_markup().as_deref(),
        Some("<div><span>new</span><em>x</em></div>")
    );
    assert!(!renderer.contains(old_child));
    for handle in renderer.elements() {
        assert!(renderer.has_click_listener(handle).unwrap());
    }
}

#[test]
fn inner_markup_is_not_validated() {
    let mut renderer = mounted("<div>x</div>");
    let div = renderer.elements()[0];
    renderer.set_inner_markup(div, "<p>unclosed").unwrap();
    assert_eq!(renderer.inner_markup(div).unwrap(), "<p>unclosed</p>");
}

#[test]
fn typing_requires_editability() {
    let mut renderer = mounted("<p>a</p>");
    let p = renderer.elements()[0];
    assert_eq!(
        renderer.replace_text(p, "b"),
        Err(SandboxError::NotEditable)
    );
    renderer.set_editable(p, true).unwrap();
    renderer.replace_text(p, "b < c").unwrap();
    assert_eq!(renderer.read_full_markup().as_deref(), Some("<p>b &lt; c</p>"));
}

#[test]
fn unmounted_renderer_rejects_handles() {
    let renderer = SandboxRenderer::default();
    let handle = NodeHandle::from_parts(1, 1);
    assert_eq!(renderer.tag_name(handle), Err(SandboxError::NotMounted));
    assert!(renderer.elements().is_empty());
}

#[test]
fn scripts_are_kept_as_markup_only() {
    let html = "<script>document.body.innerHTML = '';</script><p>safe</p>";
    let renderer = mounted(html);
    assert_eq!(renderer.read_full_markup().as_deref(), Some(html));
}
