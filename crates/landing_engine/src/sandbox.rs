use askama::Template;
use landing_logging::{landing_debug, landing_trace, landing_warn};
use thiserror::Error;

use crate::dom::{Document, ElementSlot, BODY_SERIAL};
use crate::overlay::{HoverPair, ListenerAllocator, ListenerOwner};

/// Opaque element reference, valid for one mount generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    generation: u64,
    serial: u64,
}

impl NodeHandle {
    pub fn from_parts(generation: u64, serial: u64) -> Self {
        Self { generation, serial }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderView {
    #[default]
    Preview,
    Source,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickEvent {
    pub handle: NodeHandle,
    pub inner_markup: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SandboxError {
    #[error("sandbox document is not mounted")]
    NotMounted,
    #[error("element handle {0:?} no longer refers to the mounted document")]
    StaleHandle(NodeHandle),
    #[error("element is not editable")]
    NotEditable,
    #[error("operation requires the preview view")]
    NotInPreview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SandboxPolicy {
    pub allow_same_origin: bool,
    pub allow_scripts: bool,
    pub allow_top_navigation: bool,
    pub allow_popups: bool,
}

impl Default for SandboxPolicy {
    fn default() -> Self {
        Self {
            allow_same_origin: true,
            allow_scripts: true,
            allow_top_navigation: false,
            allow_popups: false,
        }
    }
}

impl SandboxPolicy {
    pub fn attribute_value(&self) -> String {
        let tokens = [
            (self.allow_same_origin, "allow-same-origin"),
            (self.allow_scripts, "allow-scripts"),
            (self.allow_top_navigation, "allow-top-navigation"),
            (self.allow_popups, "allow-popups"),
        ];
        tokens
            .iter()
            .filter(|(allowed, _)| *allowed)
            .map(|(_, token)| *token)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug)]
struct Surface {
    document: Document,
    view: RenderView,
}

/// Isolated rendering surface; callers only see handles and serialized markup.
#[derive(Debug, Default)]
pub struct SandboxRenderer {
    policy: SandboxPolicy,
    surface: Option<Surface>,
    generation: u64,
    listeners: ListenerAllocator,
}

impl SandboxRenderer {
    pub fn new(policy: SandboxPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> SandboxPolicy {
        self.policy
    }

    pub fn is_mounted(&self) -> bool {
        self.surface.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn view(&self) -> Option<RenderView> {
        self.surface.as_ref().map(|surface| surface.view)
    }

    /// Replaces the whole document and returns the new generation.
    pub fn mount(&mut self, buffer: &str, view: RenderView) -> u64 {
        let mut document = Document::new();
        let body = document.body();
        match view {
            RenderView::Source => {
                if let Some(pre) = document.append_element(body, "pre") {
                    document.append_text(pre, buffer);
                }
            }
            RenderView::Preview => {
                document.append_html(body, buffer);
            }
        }
        self.generation += 1;
        self.surface = Some(Surface { document, view });
        let instrumented = self.instrument();
        landing_debug!(
            "Mounted generation={} view={:?} bytes={} instrumented={}",
            self.generation,
            view,
            buffer.len(),
            instrumented
        );
        self.generation
    }

    /// Appends `fragment` inside a fresh `<div>`. Returns the number of
    /// elements added, or `None` when nothing is mounted yet.
    pub fn append_fragment(&mut self, fragment: &str) -> Option<usize> {
        let Some(surface) = self.surface.as_mut() else {
            landing_debug!("Dropping fragment of {} bytes: no document", fragment.len());
            return None;
        };
        let body = surface.document.body();
        let wrapper = surface.document.append_element(body, "div")?;
        let added = surface.document.append_html(wrapper, fragment).len() + 1;
        self.instrument();
        landing_trace!("Appended fragment with {} elements", added);
        Some(added)
    }

    pub fn read_full_markup(&self) -> Option<String> {
        let surface = self.surface.as_ref()?;
        Some(surface.document.inner_html(surface.document.body()))
    }

    pub fn elements(&self) -> Vec<NodeHandle> {
        let Some(surface) = self.surface.as_ref() else {
            return Vec::new();
        };
        surface
            .document
            .element_serials()
            .into_iter()
            .map(|serial| NodeHandle::from_parts(self.generation, serial))
            .collect()
    }

    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.resolve(handle).is_ok()
    }

    pub fn tag_name(&self, handle: NodeHandle) -> Result<String, SandboxError> {
        let (surface, id) = self.resolve(handle)?;
        surface
            .document
            .tag_name(id)
            .map(str::to_string)
            .ok_or(SandboxError::StaleHandle(handle))
    }

    pub fn inner_markup(&self, handle: NodeHandle) -> Result<String, SandboxError> {
        let (surface, id) = self.resolve(handle)?;
        Ok(surface.document.inner_html(id))
    }

    pub fn outer_markup(&self, handle: NodeHandle) -> Result<String, SandboxError> {
        let (surface, id) = self.resolve(handle)?;
        Ok(surface.document.outer_html(id))
    }

    /// Handles of the replaced descendants become stale.
    pub fn set_inner_markup(&mut self, handle: NodeHandle, markup: &str) -> Result<(), SandboxError> {
        let (_, id) = self.resolve(handle)?;
        if let Some(surface) = self.surface.as_mut() {
            surface.document.clear_children(id);
            surface.document.append_html(id, markup);
        }
        self.instrument();
        Ok(())
    }

    pub fn set_editable(&mut self, handle: NodeHandle, editable: bool) -> Result<(), SandboxError> {
        self.element_mut(handle)?.editable = editable;
        Ok(())
    }

    pub fn is_editable(&self, handle: NodeHandle) -> Result<bool, SandboxError> {
        let (surface, id) = self.resolve(handle)?;
        Ok(surface.document.slot(id).is_some_and(|slot| slot.editable))
    }

    /// Typing into a content-editable element: the content becomes plain text.
    pub fn replace_text(&mut self, handle: NodeHandle, text: &str) -> Result<(), SandboxError> {
        let (surface, id) = self.resolve(handle)?;
        if !surface.document.slot(id).is_some_and(|slot| slot.editable) {
            return Err(SandboxError::NotEditable);
        }
        if let Some(surface) = self.surface.as_mut() {
            surface.document.clear_children(id);
            surface.document.append_text(id, text);
        }
        Ok(())
    }

    /// Fills empty overlay slots in the preview; returns how many changed.
    pub fn instrument(&mut self) -> usize {
        let Some(surface) = self.surface.as_mut() else {
            return 0;
        };
        if surface.view != RenderView::Preview {
            return 0;
        }
        let mut changed = 0;
        for serial in surface.document.element_serials() {
            let Some(id) = surface.document.lookup(serial) else {
                continue;
            };
            if let Some(slot) = surface.document.slot_mut(id) {
                if slot.overlay.apply_overlay(&mut self.listeners) {
                    changed += 1;
                }
            }
        }
        changed
    }

    pub fn pointer_enter(&mut self, handle: NodeHandle) -> Result<bool, SandboxError> {
        Ok(self.element_mut(handle)?.overlay.pointer_enter())
    }

    pub fn pointer_leave(&mut self, handle: NodeHandle) -> Result<(), SandboxError> {
        self.element_mut(handle)?.overlay.pointer_leave();
        Ok(())
    }

    pub fn click(&self, handle: NodeHandle) -> Result<Option<ClickEvent>, SandboxError> {
        let (surface, id) = self.resolve(handle)?;
        let listening = surface
            .document
            .slot(id)
            .is_some_and(|slot| slot.overlay.has_click());
        if !listening {
            return Ok(None);
        }
        Ok(Some(ClickEvent {
            handle,
            inner_markup: surface.document.inner_html(id),
        }))
    }

    pub fn is_highlighted(&self, handle: NodeHandle) -> Result<bool, SandboxError> {
        let (surface, id) = self.resolve(handle)?;
        Ok(surface
            .document
            .slot(id)
            .is_some_and(|slot| slot.overlay.is_highlighted()))
    }

    pub fn hover_listeners(
        &self,
        handle: NodeHandle,
    ) -> Result<Option<(HoverPair, ListenerOwner)>, SandboxError> {
        let (surface, id) = self.resolve(handle)?;
        Ok(surface.document.slot(id).and_then(|slot| slot.overlay.hover()))
    }

    pub fn has_click_listener(&self, handle: NodeHandle) -> Result<bool, SandboxError> {
        let (surface, id) = self.resolve(handle)?;
        Ok(surface
            .document
            .slot(id)
            .is_some_and(|slot| slot.overlay.has_click()))
    }

    pub(crate) fn attach_hover_pair(&mut self, handle: NodeHandle) -> Result<HoverPair, SandboxError> {
        let pair = self.listeners.hover_pair();
        self.element_mut(handle)?
            .overlay
            .install_hover(pair, ListenerOwner::EditSession);
        Ok(pair)
    }

    pub(crate) fn detach_hover_pair(
        &mut self,
        handle: NodeHandle,
        pair: HoverPair,
    ) -> Result<bool, SandboxError> {
        Ok(self.element_mut(handle)?.overlay.remove_hover(pair))
    }

    /// Host document embedding the current markup in a sandboxed iframe.
    pub fn host_page(&self) -> Option<String> {
        let markup = self.read_full_markup()?;
        let sandbox = self.policy.attribute_value();
        let page = HostPage {
            sandbox: &sandbox,
            markup: &markup,
        };
        match page.render() {
            Ok(html) => Some(html),
            Err(err) => {
                landing_warn!("Host page rendering failed: {}", err);
                None
            }
        }
    }

    fn resolve(&self, handle: NodeHandle) -> Result<(&Surface, ego_tree::NodeId), SandboxError> {
        let surface = self.surface.as_ref().ok_or(SandboxError::NotMounted)?;
        if handle.generation != self.generation || handle.serial == BODY_SERIAL {
            return Err(SandboxError::StaleHandle(handle));
        }
        let id = surface
            .document
            .lookup(handle.serial)
            .ok_or(SandboxError::StaleHandle(handle))?;
        Ok((surface, id))
    }

    fn element_mut(&mut self, handle: NodeHandle) -> Result<&mut ElementSlot, SandboxError> {
        let (_, id) = self.resolve(handle)?;
        self.surface
            .as_mut()
            .and_then(|surface| surface.document.slot_mut(id))
            .ok_or(SandboxError::StaleHandle(handle))
    }
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html><head><meta charset="utf-8"></head><body><iframe sandbox="{{ sandbox }}" srcdoc="{{ markup }}" style="width:100%;height:100vh;border:0"></iframe></body></html>
"#,
    ext = "html"
)]
struct HostPage<'a> {
    sandbox: &'a str,
    markup: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_allows_scripts_but_not_navigation() {
        let policy = SandboxPolicy::default();
        assert_eq!(policy.attribute_value(), "allow-same-origin allow-scripts");
    }

    #[test]
    fn body_is_not_addressable() {
        let mut renderer = SandboxRenderer::default();
        let generation = renderer.mount("<p>a</p>", RenderView::Preview);
        let body = NodeHandle::from_parts(generation, BODY_SERIAL);
        assert_eq!(
            renderer.inner_markup(body),
            Err(SandboxError::StaleHandle(body))
        );
    }

    #[test]
    fn host_page_escapes_markup_into_srcdoc() {
        let mut renderer = SandboxRenderer::default();
        renderer.mount(r#"<p class="x">a & b</p>"#, RenderView::Preview);
        let page = renderer.host_page().unwrap();
        assert!(page.contains(r#"sandbox="allow-same-origin allow-scripts""#));
        assert!(page.contains(r#"srcdoc="&lt;p class="#));
        assert!(page.contains(r#"a &amp;amp; b&lt;/p&gt;""#));
        assert!(!page.contains("<p"));
    }
}
