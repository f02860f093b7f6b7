use crate::models::CurrentAdmin;

/// Base template trait providing common properties for all templates.
pub trait BaseTemplate {
    fn current_admin(&self) -> &Option<CurrentAdmin>;
    fn backend_label(&self) -> &str;
    fn base_url(&self) -> &str;
    fn flash_messages(&self) -> &Vec<String>;
    fn has_flash_messages(&self) -> bool;
}

/// Macro to implement BaseTemplate for a struct with standard fields
#[macro_export]
macro_rules! impl_base_template {
    ($struct_name:ty) => {
        impl $crate::templates::BaseTemplate for $struct_name {
            fn current_admin(&self) -> &Option<$crate::models::CurrentAdmin> {
                &self.current_admin
            }
            fn backend_label(&self) -> &str {
                &self.backend_label
            }
            fn base_url(&self) -> &str {
                &self.base_url
            }
            fn flash_messages(&self) -> &Vec<String> {
                &self.flash_messages
            }
            fn has_flash_messages(&self) -> bool {
                self.has_flash_messages
            }
        }
    };
}
