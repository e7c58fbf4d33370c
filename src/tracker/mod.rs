pub mod debounce;
pub mod gesture;
pub mod sit_stand;
pub mod smooth;

pub use debounce::DebounceController;
pub use gesture::{Bound, CycleDetector, Gesture, GestureDetector, GestureState};
pub use sit_stand::{min_knee_angle, SitStandDetector, Stance};
pub use smooth::{HeightSmoother, SampleWindow};
