use crate::defs::ProgressReporter;

pub struct EmptyProgress;

impl ProgressReporter for EmptyProgress {
    fn start(&mut self, _total: usize, _label: &str) {
        // Nothing to show.
    }
    fn advance(&mut self, _item: &str) {}
    fn finish(&mut self) {}
}
