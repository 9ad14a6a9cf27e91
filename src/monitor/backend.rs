/// Input-select access to the displays attached right now
///
/// Implementations are stateless between calls: every switch starts from a
/// fresh [`enumerate_displays`](DisplayTransport::enumerate_displays), since
/// monitors come and go between hotplug events. Failures are reported as
/// `None`/`false`, never as errors, because a sleeping or unsupported display
/// is an expected condition.
pub trait DisplayTransport {
    type Display;

    /// Snapshot of the DDC-capable displays, in a stable order
    fn enumerate_displays(&self) -> Vec<Self::Display>;

    /// Name used in log lines
    fn display_name(&self, display: &Self::Display) -> String;

    /// Current input-select code, `None` if the display did not answer
    fn read_input(&self, display: &mut Self::Display) -> Option<u16>;

    /// Whether the display acknowledged the new input-select code
    fn write_input(&self, display: &mut Self::Display, code: u16) -> bool;
}
