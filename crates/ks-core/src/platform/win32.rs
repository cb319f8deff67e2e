//! Windows bindings: IMM32 status query, `SendInput` key taps and UI Automation.

use std::mem;

use tracing::debug;
use windows::core::{w, Interface, VARIANT};
use windows::Wdk::System::SystemServices::RtlGetVersion;
use windows::Win32::Foundation::{HWND, LPARAM, RPC_E_CHANGED_MODE, WPARAM};
use windows::Win32::System::Com::{
    CoCreateInstance, CoInitializeEx, CLSCTX_INPROC_SERVER, COINIT_MULTITHREADED,
};
use windows::Win32::System::SystemInformation::OSVERSIONINFOW;
use windows::Win32::UI::Accessibility::{
    CUIAutomation, IUIAutomation, IUIAutomationElement, IUIAutomationLegacyIAccessiblePattern,
    TreeScope_Descendants, UIA_ButtonControlTypeId, UIA_ControlTypePropertyId,
    UIA_LegacyIAccessiblePatternId,
};
use windows::Win32::UI::Input::Ime::{ImmGetContext, ImmGetDefaultIMEWnd, ImmReleaseContext, HIMC};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYBD_EVENT_FLAGS, KEYEVENTF_KEYUP,
    VK_LSHIFT,
};
use windows::Win32::UI::WindowsAndMessaging::{FindWindowW, GetForegroundWindow, SendMessageW};

use super::{
    AutomationApi, AutomationFault, ImeQuery, ImeStatus, InjectError, KeyInjector, ProbeError,
    CHANGED_MODE_SIGNATURE, CREATE_FAILED_SIGNATURE,
};

const WM_IME_CONTROL: u32 = 0x0283;
const IMC_GETCONVERSIONMODE: usize = 0x0001;

pub(super) fn build_number() -> Option<u32> {
    let mut info = OSVERSIONINFOW {
        dwOSVersionInfoSize: mem::size_of::<OSVERSIONINFOW>() as u32,
        ..Default::default()
    };
    let status = unsafe { RtlGetVersion(&mut info) };
    status.is_ok().then_some(info.dwBuildNumber)
}

// ---------------------------------------------------------------------------
// IMM32
// ---------------------------------------------------------------------------

/// Input context held for the duration of a query; released on drop.
struct InputContext {
    window: HWND,
    himc: HIMC,
}

impl InputContext {
    fn acquire(window: HWND) -> Option<Self> {
        let himc = unsafe { ImmGetContext(window) };
        (!himc.0.is_null()).then_some(Self { window, himc })
    }
}

impl Drop for InputContext {
    fn drop(&mut self) {
        unsafe {
            let _ = ImmReleaseContext(self.window, self.himc);
        }
    }
}

pub struct Imm32;

impl ImeQuery for Imm32 {
    fn foreground_ime_status(&self) -> Result<ImeStatus, ProbeError> {
        let window = unsafe { GetForegroundWindow() };
        if window.0.is_null() {
            return Err(ProbeError::NoForegroundWindow);
        }
        let _context = InputContext::acquire(window);

        let ime_window = unsafe { ImmGetDefaultIMEWnd(window) };
        if ime_window.0.is_null() {
            return Ok(ImeStatus::NoImeWindow);
        }
        let mode = unsafe {
            SendMessageW(
                ime_window,
                WM_IME_CONTROL,
                WPARAM(IMC_GETCONVERSIONMODE),
                LPARAM(0),
            )
        };
        Ok(ImeStatus::ConversionMode(mode.0))
    }
}

// ---------------------------------------------------------------------------
// Keyboard injection
// ---------------------------------------------------------------------------

fn key_input(flags: KEYBD_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VK_LSHIFT,
                wScan: 0,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

/// Left Shift press + release.
pub struct ShiftTap;

impl KeyInjector for ShiftTap {
    fn tap_switch_key(&self) -> Result<(), InjectError> {
        let inputs = [key_input(KEYBD_EVENT_FLAGS(0)), key_input(KEYEVENTF_KEYUP)];
        let sent = unsafe { SendInput(&inputs, mem::size_of::<INPUT>() as i32) };
        if sent as usize == inputs.len() {
            Ok(())
        } else {
            Err(InjectError::Rejected {
                sent,
                expected: inputs.len() as u32,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// UI Automation
// ---------------------------------------------------------------------------

fn fault(err: windows::core::Error) -> AutomationFault {
    let code = err.code();
    let message = format!("0x{:08X} {}", code.0 as u32, err.message());
    if code == RPC_E_CHANGED_MODE {
        AutomationFault::new(format!("{CHANGED_MODE_SIGNATURE} {message}"))
    } else {
        AutomationFault::new(message)
    }
}

/// UI Automation client, created lazily on first use.
#[derive(Default)]
pub struct UiAutomation {
    automation: Option<IUIAutomation>,
}

impl UiAutomation {
    fn automation(&mut self) -> Result<IUIAutomation, AutomationFault> {
        if let Some(automation) = &self.automation {
            return Ok(automation.clone());
        }
        unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) }
            .ok()
            .map_err(fault)?;
        let automation: IUIAutomation =
            unsafe { CoCreateInstance(&CUIAutomation, None, CLSCTX_INPROC_SERVER) }
                .map_err(|err| {
                    AutomationFault::new(format!("{CREATE_FAILED_SIGNATURE} {}", fault(err)))
                })?;
        debug!("UI automation client created");
        self.automation = Some(automation.clone());
        Ok(automation)
    }
}

impl AutomationApi for UiAutomation {
    type Window = HWND;
    type Element = IUIAutomationElement;

    fn connect(&mut self) -> Result<(), AutomationFault> {
        self.automation().map(|_| ())
    }

    fn find_tray_window(&mut self) -> Result<Option<HWND>, AutomationFault> {
        match unsafe { FindWindowW(w!("Shell_TrayWnd"), None) } {
            Ok(hwnd) if !hwnd.0.is_null() => Ok(Some(hwnd)),
            Ok(_) => Ok(None),
            Err(err) => {
                debug!(error = %err, "Shell_TrayWnd lookup failed");
                Ok(None)
            }
        }
    }

    fn element_from_window(
        &mut self,
        window: &HWND,
    ) -> Result<Option<IUIAutomationElement>, AutomationFault> {
        let automation = self.automation()?;
        unsafe { automation.ElementFromHandle(*window) }
            .map(Some)
            .map_err(fault)
    }

    fn find_buttons(
        &mut self,
        root: &IUIAutomationElement,
    ) -> Result<Vec<IUIAutomationElement>, AutomationFault> {
        let automation = self.automation()?;
        let condition = unsafe {
            automation.CreatePropertyCondition(
                UIA_ControlTypePropertyId,
                &VARIANT::from(UIA_ButtonControlTypeId.0),
            )
        }
        .map_err(fault)?;
        let found = unsafe { root.FindAll(TreeScope_Descendants, &condition) }.map_err(fault)?;
        let len = unsafe { found.Length() }.map_err(fault)?;
        (0..len)
            .map(|i| unsafe { found.GetElement(i) }.map_err(fault))
            .collect()
    }

    fn name(&mut self, element: &IUIAutomationElement) -> Result<String, AutomationFault> {
        unsafe { element.CurrentName() }
            .map(|name| name.to_string())
            .map_err(fault)
    }

    fn invoke_default_action(
        &mut self,
        element: &IUIAutomationElement,
    ) -> Result<(), AutomationFault> {
        let pattern = unsafe { element.GetCurrentPattern(UIA_LegacyIAccessiblePatternId) }
            .map_err(fault)?;
        let legacy: IUIAutomationLegacyIAccessiblePattern = pattern.cast().map_err(fault)?;
        unsafe { legacy.DoDefaultAction() }.map_err(fault)
    }
}
