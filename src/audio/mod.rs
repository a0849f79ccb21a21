pub mod chunk;
pub mod device;
pub mod file;
pub mod wave;

#[cfg(feature = "microphone")]
pub mod microphone;

pub use chunk::ChunkBuffer;
pub use device::{
    AudioChunk, AudioDevice, AudioDeviceFactory, AudioFormat, DeviceConfig, DeviceSource,
};
pub use file::{AudioFile, FileDevice};
pub use wave::{EncodedContainer, WaveContainerEncoder, WaveError, WaveHeader, WAV_HEADER_SIZE};
