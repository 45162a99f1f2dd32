//! Display and View management.
//!
//! Output transforms are organized through displays and views:
//! - **Display**: a physical or virtual display device (monitor, projector)
//! - **View**: a viewing condition on that display (Film, Log, Raw)
//!
//! Each (display, view) pair names a target color space and an optional
//! look chain. Active display/view lists only steer default selection;
//! inactive entries stay addressable.
//!
//! # Example
//!
//! ```
//! use vfx_colorconfig::DisplayManager;
//!
//! let mut displays = DisplayManager::new();
//! displays.add_display("sRGB", "Film", "srgb8", "");
//! displays.add_display("sRGB", "Raw", "nc10", "");
//!
//! assert_eq!(displays.num_views("sRGB"), 2);
//! assert_eq!(displays.default_view("sRGB"), Some("Film"));
//! ```

/// A view within a display.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    name: String,
    colorspace: String,
    looks: String,
}

impl View {
    /// Creates a new view targeting `colorspace`.
    pub fn new(name: impl Into<String>, colorspace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            colorspace: colorspace.into(),
            looks: String::new(),
        }
    }

    /// Sets the look chain.
    pub fn with_looks(mut self, looks: impl Into<String>) -> Self {
        self.looks = looks.into();
        self
    }

    /// Returns the view name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the target color space.
    #[inline]
    pub fn colorspace(&self) -> &str {
        &self.colorspace
    }

    /// Returns the look chain; empty when the view has none.
    #[inline]
    pub fn looks(&self) -> &str {
        &self.looks
    }
}

/// A display device and its views, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Display {
    name: String,
    views: Vec<View>,
}

impl Display {
    /// Creates a display without views.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            views: Vec::new(),
        }
    }

    /// Returns the display name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a view, replacing one with the same name in place.
    pub fn add_view(&mut self, view: View) {
        match self.views.iter_mut().find(|v| v.name == view.name) {
            Some(existing) => *existing = view,
            None => self.views.push(view),
        }
    }

    /// Returns all views.
    #[inline]
    pub fn views(&self) -> &[View] {
        &self.views
    }

    /// Gets a view by name.
    pub fn view(&self, name: &str) -> Option<&View> {
        self.views.iter().find(|v| v.name == name)
    }
}

/// Collection of displays plus the active display/view preferences.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisplayManager {
    displays: Vec<Display>,
    active_displays: Vec<String>,
    active_views: Vec<String>,
}

impl DisplayManager {
    /// Creates an empty display manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a view to `display`, creating the display on first use.
    pub fn add_display(
        &mut self,
        display: &str,
        view: &str,
        colorspace: &str,
        looks: &str,
    ) {
        let view = View::new(view, colorspace).with_looks(looks);
        match self.displays.iter_mut().find(|d| d.name == display) {
            Some(existing) => existing.add_view(view),
            None => {
                let mut created = Display::new(display);
                created.add_view(view);
                self.displays.push(created);
            }
        }
    }

    /// Returns all displays.
    #[inline]
    pub fn displays(&self) -> &[Display] {
        &self.displays
    }

    /// Gets a display by name.
    pub fn display(&self, name: &str) -> Option<&Display> {
        self.displays.iter().find(|d| d.name == name)
    }

    /// Looks up the view of a display.
    pub fn view(&self, display: &str, view: &str) -> Option<&View> {
        self.display(display).and_then(|d| d.view(view))
    }

    /// Number of displays.
    #[inline]
    pub fn num_displays(&self) -> usize {
        self.displays.len()
    }

    /// Display name at `index`.
    pub fn display_name(&self, index: usize) -> Option<&str> {
        self.displays.get(index).map(|d| d.name.as_str())
    }

    /// Number of views of `display`; zero if the display is unknown.
    pub fn num_views(&self, display: &str) -> usize {
        self.display(display).map_or(0, |d| d.views.len())
    }

    /// View name at `index` within `display`.
    pub fn view_name(&self, display: &str, index: usize) -> Option<&str> {
        self.display(display)
            .and_then(|d| d.views.get(index))
            .map(|v| v.name.as_str())
    }

    /// First active display that exists, else the first display.
    pub fn default_display(&self) -> Option<&str> {
        self.active_displays
            .iter()
            .find_map(|name| self.display(name))
            .or_else(|| self.displays.first())
            .map(|d| d.name.as_str())
    }

    /// First active view that `display` has, else its first view.
    pub fn default_view(&self, display: &str) -> Option<&str> {
        let d = self.display(display)?;
        self.active_views
            .iter()
            .find_map(|name| d.view(name))
            .or_else(|| d.views.first())
            .map(|v| v.name.as_str())
    }

    /// Sets active displays from a comma-delimited list.
    pub fn set_active_displays(&mut self, displays: &str) {
        self.active_displays = split_list(displays);
    }

    /// Active displays joined with `", "`.
    pub fn active_displays(&self) -> String {
        self.active_displays.join(", ")
    }

    /// Active display names.
    #[inline]
    pub fn active_display_list(&self) -> &[String] {
        &self.active_displays
    }

    /// Sets active views from a comma-delimited list.
    pub fn set_active_views(&mut self, views: &str) {
        self.active_views = split_list(views);
    }

    /// Active views joined with `", "`.
    pub fn active_views(&self) -> String {
        self.active_views.join(", ")
    }

    /// Active view names.
    #[inline]
    pub fn active_view_list(&self) -> &[String] {
        &self.active_views
    }

    /// Removes every display. Active lists are kept.
    pub fn clear(&mut self) {
        self.displays.clear();
    }
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn film_displays() -> DisplayManager {
        let mut mgr = DisplayManager::new();
        mgr.add_display("DCIP3", "Film", "p3dci8", "");
        mgr.add_display("sRGB", "Film", "srgb8", "");
        mgr.add_display("sRGB", "Log", "lg10", "");
        mgr.add_display("sRGB", "Raw", "nc10", "");
        mgr
    }

    #[test]
    fn implicit_display_creation() {
        let mgr = film_displays();

        assert_eq!(mgr.num_displays(), 2);
        assert_eq!(mgr.display_name(1), Some("sRGB"));
        assert_eq!(mgr.num_views("sRGB"), 3);
        assert_eq!(mgr.view_name("sRGB", 2), Some("Raw"));
        assert_eq!(mgr.num_views("missing"), 0);
        assert_eq!(mgr.view_name("sRGB", 9), None);
    }

    #[test]
    fn view_replaced_in_place() {
        let mut mgr = film_displays();
        mgr.add_display("sRGB", "Log", "lgf", "di");

        assert_eq!(mgr.num_views("sRGB"), 3);
        let view = mgr.view("sRGB", "Log").unwrap();
        assert_eq!(view.colorspace(), "lgf");
        assert_eq!(view.looks(), "di");
        assert_eq!(mgr.view_name("sRGB", 1), Some("Log"));
    }

    #[test]
    fn defaults_follow_active_lists() {
        let mut mgr = film_displays();
        assert_eq!(mgr.default_display(), Some("DCIP3"));
        assert_eq!(mgr.default_view("sRGB"), Some("Film"));

        mgr.set_active_displays("missing, sRGB");
        mgr.set_active_views("Raw, Log");
        assert_eq!(mgr.default_display(), Some("sRGB"));
        assert_eq!(mgr.default_view("sRGB"), Some("Raw"));
        assert_eq!(mgr.default_view("DCIP3"), Some("Film"));
    }

    #[test]
    fn active_lists_round_trip() {
        let mut mgr = DisplayManager::new();
        mgr.set_active_views("Log,Raw");
        assert_eq!(mgr.active_views(), "Log, Raw");
        assert_eq!(mgr.active_view_list().len(), 2);

        mgr.set_active_displays("");
        assert_eq!(mgr.active_displays(), "");
    }
}
