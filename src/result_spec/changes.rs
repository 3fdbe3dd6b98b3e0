//! Narrow change predicates between two result specs
//!
//! Only specific sub-fields decide whether a result must be rebuilt or
//! requeried, so these compare pieces rather than whole specs.

use super::spec::ResultSpec;
use crate::visualization::VisualizationType;

impl ResultSpec {
    pub fn custom_fields_changed(&self, prev: &ResultSpec) -> bool {
        self.custom_fields != prev.custom_fields
    }

    pub fn data_filters_changed(&self, prev: &ResultSpec) -> bool {
        self.data_filters != prev.data_filters
    }

    pub fn custom_fields_or_data_filters_changed(&self, prev: &ResultSpec) -> bool {
        self.custom_fields_changed(prev) || self.data_filters_changed(prev)
    }

    pub fn null_value_display_changed(&self, prev: &ResultSpec, viz: VisualizationType) -> bool {
        self.null_value_display(viz) != prev.null_value_display(viz)
    }

    pub fn bucket_type_changed(&self, prev: &ResultSpec, viz: VisualizationType) -> bool {
        self.bucket_type(viz) != prev.bucket_type(viz)
    }

    /// Series labels, colors or visibility changed. Render-only.
    pub fn series_settings_changed(&self, prev: &ResultSpec, viz: VisualizationType) -> bool {
        self.settings(viz).series != prev.settings(viz).series
    }
}
