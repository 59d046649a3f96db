use std::collections::HashMap;

use landing_logging::{landing_debug, landing_warn};

use crate::overlay::HoverPair;
use crate::sandbox::{NodeHandle, RenderView, SandboxError, SandboxRenderer};

/// In-place editing of the whole sandbox document.
///
/// The registry maps each editable element to the hover pair installed for
/// it, so disabling removes exactly those listeners.
#[derive(Debug, Default)]
pub struct EditSession {
    active: bool,
    registry: HashMap<NodeHandle, HoverPair>,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn registry_len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_registered(&self, handle: NodeHandle) -> bool {
        self.registry.contains_key(&handle)
    }

    pub fn registered_pair(&self, handle: NodeHandle) -> Option<HoverPair> {
        self.registry.get(&handle).copied()
    }

    /// Returns the number of registered elements.
    pub fn enable(&mut self, renderer: &mut SandboxRenderer) -> Result<usize, SandboxError> {
        match renderer.view() {
            None => return Err(SandboxError::NotMounted),
            Some(RenderView::Source) => return Err(SandboxError::NotInPreview),
            Some(RenderView::Preview) => {}
        }
        let released = self.release(renderer);
        if released > 0 {
            landing_debug!("Released {} listener pairs before re-enabling", released);
        }

        self.active = true;
        if let Err(err) = self.adopt(renderer) {
            self.active = false;
            return Err(err);
        }
        landing_debug!(
            "Edit session enabled generation={} elements={}",
            renderer.generation(),
            self.registry.len()
        );
        Ok(self.registry.len())
    }

    /// Registers elements that appeared while the session was active.
    ///
    /// Returns how many were added; does nothing when inactive.
    pub fn adopt(&mut self, renderer: &mut SandboxRenderer) -> Result<usize, SandboxError> {
        if !self.active {
            return Ok(0);
        }
        let mut adopted = 0;
        for handle in renderer.elements() {
            if self.registry.contains_key(&handle) {
                continue;
            }
            renderer.set_editable(handle, true)?;
            let pair = renderer.attach_hover_pair(handle)?;
            self.registry.insert(handle, pair);
            adopted += 1;
        }
        Ok(adopted)
    }

    /// Returns the number of hover pairs removed.
    pub fn disable(&mut self, renderer: &mut SandboxRenderer) -> usize {
        let released = self.release(renderer);
        for handle in renderer.elements() {
            if let Err(err) = renderer.set_editable(handle, false) {
                landing_warn!("Could not clear editability on {:?}: {}", handle, err);
            }
        }
        renderer.instrument();
        self.active = false;
        landing_debug!("Edit session disabled, released {} pairs", released);
        released
    }

    /// Forgets everything without touching the renderer.
    pub fn discard(&mut self) {
        self.registry.clear();
        self.active = false;
    }

    /// Drops entries whose elements are gone from the document.
    pub fn prune(&mut self, renderer: &SandboxRenderer) -> usize {
        let before = self.registry.len();
        self.registry.retain(|handle, _| renderer.contains(*handle));
        before - self.registry.len()
    }

    fn release(&mut self, renderer: &mut SandboxRenderer) -> usize {
        let mut released = 0;
        for (handle, pair) in self.registry.drain() {
            if let Ok(true) = renderer.detach_hover_pair(handle, pair) {
                released += 1;
            }
            match renderer.set_editable(handle, false) {
                // Replaced elements took their editability with them.
                Ok(()) | Err(SandboxError::StaleHandle(_)) => {}
                Err(err) => {
                    landing_warn!("Could not clear editability on {:?}: {}", handle, err);
                }
            }
        }
        released
    }
}
