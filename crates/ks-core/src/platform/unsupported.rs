use super::{
    AutomationApi, AutomationFault, ImeQuery, ImeStatus, InjectError, KeyInjector, ProbeError,
};

pub struct UnsupportedIme;

impl ImeQuery for UnsupportedIme {
    fn foreground_ime_status(&self) -> Result<ImeStatus, ProbeError> {
        Err(ProbeError::Unsupported)
    }
}

pub struct UnsupportedKeys;

impl KeyInjector for UnsupportedKeys {
    fn tap_switch_key(&self) -> Result<(), InjectError> {
        Err(InjectError::Unsupported)
    }
}

/// No taskbar to find; every toggle ends in `TrayWindowNotFound`.
pub struct UnsupportedAutomation;

impl AutomationApi for UnsupportedAutomation {
    type Window = ();
    type Element = ();

    fn find_tray_window(&mut self) -> Result<Option<()>, AutomationFault> {
        Ok(None)
    }

    fn element_from_window(&mut self, _window: &()) -> Result<Option<()>, AutomationFault> {
        Ok(None)
    }

    fn find_buttons(&mut self, _root: &()) -> Result<Vec<()>, AutomationFault> {
        Ok(Vec::new())
    }

    fn name(&mut self, _element: &()) -> Result<String, AutomationFault> {
        Err(AutomationFault::new("UI automation unsupported on this platform"))
    }

    fn invoke_default_action(&mut self, _element: &()) -> Result<(), AutomationFault> {
        Err(AutomationFault::new("UI automation unsupported on this platform"))
    }
}
