
//! Late bound `IDispatch` calls

use windows::core::{Interface, BSTR, GUID, HSTRING, IUnknown, PCWSTR, VARIANT};
use windows::Win32::System::Com::{
    CoGetObject, IDispatch, DISPATCH_FLAGS, DISPATCH_METHOD, DISPATCH_PROPERTYGET,
    DISPATCH_PROPERTYPUT, DISPPARAMS, EXCEPINFO,
};
use windows::Win32::System::Ole::DISPID_PROPERTYPUT;

use crate::sap::{ScriptArg, ScriptingObject};

const LOCALE_USER_DEFAULT: u32 = 0x0400;

/// A scripting object reached through `IDispatch`
pub struct DispatchObject {
    inner: IDispatch,
}

impl DispatchObject {
    /// Bind to a running object by display name, like VBScript's `GetObject("SAPGUI")`
    pub fn from_moniker(name: &str) -> Result<Self, String> {
        let name = HSTRING::from(name);
        let inner: IDispatch = unsafe { CoGetObject(&name, None) }.map_err(|e| e.message().to_string())?;

        Ok(Self { inner })
    }

    pub fn get_property(&self, name: &str) -> Result<VARIANT, String> {
        self.invoke(name, DISPATCH_PROPERTYGET, &[])
    }

    pub fn set_property(&self, name: &str, value: VARIANT) -> Result<(), String> {
        self.invoke(name, DISPATCH_PROPERTYPUT, &[value]).map(|_| ())
    }

    /// Call a method, or read a property the way VBScript does
    pub fn invoke_method(&self, name: &str, args: &[VARIANT]) -> Result<VARIANT, String> {
        self.invoke(name, DISPATCH_METHOD | DISPATCH_PROPERTYGET, args)
    }

    pub fn get_child(&self, name: &str) -> Result<DispatchObject, String> {
        variant_object(&self.get_property(name)?, name)
    }

    pub fn invoke_child(&self, name: &str, args: &[VARIANT]) -> Result<DispatchObject, String> {
        variant_object(&self.invoke_method(name, args)?, name)
    }

    fn dispid(&self, name: &str) -> Result<i32, String> {
        let wide = HSTRING::from(name);
        let names = [PCWSTR(wide.as_ptr())];
        let mut id = 0i32;

        unsafe {
            self.inner
                .GetIDsOfNames(&GUID::zeroed(), names.as_ptr(), 1, LOCALE_USER_DEFAULT, &mut id)
        }
        .map_err(|e| format!("unknown member `{}`: {}", name, e.message()))?;

        Ok(id)
    }

    fn invoke(&self, name: &str, flags: DISPATCH_FLAGS, args: &[VARIANT]) -> Result<VARIANT, String> {
        let id = self.dispid(name)?;
        let put = flags == DISPATCH_PROPERTYPUT;

        // IDispatch takes arguments last to first
        let mut args: Vec<VARIANT> = args.iter().rev().cloned().collect();
        let mut named = [DISPID_PROPERTYPUT];

        let params = DISPPARAMS {
            rgvarg: args.as_mut_ptr() as *mut _,
            rgdispidNamedArgs: if put { named.as_mut_ptr() } else { std::ptr::null_mut() },
            cArgs: args.len() as u32,
            cNamedArgs: if put { 1 } else { 0 },
        };

        let mut result = VARIANT::default();
        let mut excep = EXCEPINFO::default();

        unsafe {
            self.inner.Invoke(
                id,
                &GUID::zeroed(),
                LOCALE_USER_DEFAULT,
                flags,
                &params,
                Some(&mut result as *mut VARIANT as *mut _),
                Some(&mut excep),
                None,
            )
        }
        .map_err(|e| {
            let description = excep.bstrDescription.to_string();
            match description.is_empty() {
                true => format!("`{}` failed: {}", name, e.message()),
                false => format!("`{}` failed: {}", name, description),
            }
        })?;

        Ok(result)
    }
}

impl ScriptingObject for DispatchObject {
    fn child(&self, name: &str) -> Result<Self, String> {
        self.get_child(name)
    }

    fn call_child(&self, name: &str, args: &[ScriptArg]) -> Result<Self, String> {
        let args: Vec<VARIANT> = args.iter().map(variant_arg).collect();
        self.invoke_child(name, &args)
    }
}

fn variant_arg(arg: &ScriptArg) -> VARIANT {
    match arg {
        ScriptArg::Str(s) => variant_str(s),
        ScriptArg::Int(i) => variant_i32(*i),
        ScriptArg::Bool(b) => variant_bool(*b),
    }
}

pub fn variant_str(value: &str) -> VARIANT {
    VARIANT::from(BSTR::from(value))
}

pub fn variant_i32(value: i32) -> VARIANT {
    VARIANT::from(value)
}

pub fn variant_bool(value: bool) -> VARIANT {
    VARIANT::from(value)
}

pub fn variant_get_string(variant: &VARIANT) -> Option<String> {
    BSTR::try_from(variant).ok().map(|s| s.to_string())
}

pub fn variant_get_i32(variant: &VARIANT) -> Option<i32> {
    i32::try_from(variant).ok()
}

fn variant_object(variant: &VARIANT, name: &str) -> Result<DispatchObject, String> {
    let unknown = IUnknown::try_from(variant).map_err(|_| format!("`{}` did not return an object", name))?;
    let inner = unknown.cast::<IDispatch>().map_err(|e| e.message().to_string())?;

    Ok(DispatchObject { inner })
}
