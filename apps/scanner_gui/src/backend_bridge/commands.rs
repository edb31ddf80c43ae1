//! Backend commands queued from UI to the scan worker.

use capture::SurfaceBounds;
use scanner_core::ScanPolicy;

pub enum BackendCommand {
    StartScanning { policy: ScanPolicy },
    StopScanning,
    ResizePreview { bounds: SurfaceBounds },
}
