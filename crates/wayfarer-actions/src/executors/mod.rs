pub mod evaluation;
pub mod extraction;
pub mod file;
pub mod interaction;
pub mod navigation;
pub mod wait;

pub(crate) fn to_port_wait(w: wayfarer_types::action::WaitUntil) -> wayfarer_types::ports::engine::WaitUntil {
    use wayfarer_types::action::WaitUntil as A;
    use wayfarer_types::ports::engine::WaitUntil as P;
    match w {
        A::Load => P::Load,
        A::DomContentLoaded => P::DomContentLoaded,
        A::NetworkIdle0 => P::NetworkIdle0,
        A::NetworkIdle2 => P::NetworkIdle2,
    }
}

/// Wire label for `metadata.waitUntil` on a navigate result.
pub(crate) fn wait_until_label(w: wayfarer_types::action::WaitUntil) -> &'static str {
    use wayfarer_types::action::WaitUntil;
    match w {
        WaitUntil::Load => "load",
        WaitUntil::DomContentLoaded => "domcontentloaded",
        WaitUntil::NetworkIdle0 => "networkidle0",
        WaitUntil::NetworkIdle2 => "networkidle2",
    }
}
