/// Common test utilities and mock infrastructure
///
/// This module provides shared functionality for integration tests including:
/// - Image-file backed mock drives
/// - Content checks on wiped images

pub mod mock_drive;
pub mod test_helpers;
