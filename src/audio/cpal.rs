// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::{fmt, sync::Arc, thread};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{error, info};

use super::{mixer::VoiceMixer, SoftwareVoice, Voice};
use crate::error::{Result, SoundError};

fn device_error(e: impl fmt::Display) -> SoundError {
    SoundError::AudioDevice(e.to_string())
}

/// Summary of an output device, for listing.
pub struct DeviceDescription {
    pub name: String,
    pub host: String,
    pub max_channels: u16,
}

impl fmt::Display for DeviceDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}) ({})",
            self.name, self.max_channels, self.host
        )
    }
}

/// A cpal output device with a running stream that renders every voice
/// created on it.
pub struct Device {
    /// The name of the device.
    name: String,
    /// The host ID of the device.
    host_id: cpal::HostId,
    mixer: VoiceMixer,
    /// Dropping this ends the output thread, which owns the stream.
    shutdown: Option<crossbeam_channel::Sender<()>>,
    output_thread: Option<thread::JoinHandle<()>>,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}) ({})",
            self.name,
            self.mixer.num_channels(),
            self.host_id.name()
        )
    }
}

/// Converts the mixer's float block into the stream's sample type.
fn create_callback<T>(mixer: VoiceMixer) -> impl FnMut(&mut [T], &cpal::OutputCallbackInfo)
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let mut scratch: Vec<f32> = Vec::new();
    move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
        scratch.resize(data.len(), 0.0);
        mixer.process_into_output(&mut scratch);
        for (out, sample) in data.iter_mut().zip(scratch.iter()) {
            *out = T::from_sample(*sample);
        }
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mixer: VoiceMixer,
) -> std::result::Result<cpal::Stream, cpal::BuildStreamError>
where
    T: cpal::SizedSample + cpal::FromSample<f32> + 'static,
{
    device.build_output_stream(
        config,
        create_callback::<T>(mixer),
        |err| error!("CPAL output stream error: {}", err),
        None,
    )
}

impl Device {
    /// Lists cpal output devices.
    pub fn list() -> Result<Vec<DeviceDescription>> {
        Ok(Device::list_cpal_devices()?
            .into_iter()
            .map(|(host_id, device, max_channels)| DeviceDescription {
                name: device.name().unwrap_or_else(|_| "unknown".to_string()),
                host: host_id.name().to_string(),
                max_channels,
            })
            .collect())
    }

    fn list_cpal_devices() -> Result<Vec<(cpal::HostId, cpal::Device, u16)>> {
        // Suppress noisy output here.
        let _shh_stdout = shh::stdout()?;
        let _shh_stderr = shh::stderr()?;

        let mut devices = Vec::new();
        for host_id in cpal::available_hosts() {
            let host = cpal::host_from_id(host_id).map_err(device_error)?;
            let host_devices = match host.output_devices() {
                Ok(host_devices) => host_devices,
                Err(e) => {
                    error!(
                        err = e.to_string(),
                        host = host_id.name(),
                        "Unable to list devices for host"
                    );
                    continue;
                }
            };

            for device in host_devices {
                let Ok(output_configs) = device.supported_output_configs() else {
                    continue;
                };
                let max_channels = output_configs.map(|c| c.channels()).max().unwrap_or(0);
                if max_channels > 0 {
                    devices.push((host_id, device, max_channels));
                }
            }
        }

        devices.sort_by_key(|(_, device, _)| device.name().unwrap_or_default());
        Ok(devices)
    }

    /// Opens the named device, or the host default for `"default"`, and starts
    /// its output stream.
    pub fn get(name: &str) -> Result<Device> {
        let (host_id, device) = if name == "default" {
            let host = cpal::default_host();
            let device = host
                .default_output_device()
                .ok_or_else(|| SoundError::AudioDevice("no default output device".into()))?;
            (host.id(), device)
        } else {
            Device::list_cpal_devices()?
                .into_iter()
                .find(|(_, device, _)| device.name().map(|n| n.trim() == name).unwrap_or(false))
                .map(|(host_id, device, _)| (host_id, device))
                .ok_or_else(|| SoundError::AudioDevice(format!("no device found with name {}", name)))?
        };

        let supported = device.default_output_config().map_err(device_error)?;
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();
        let mixer = VoiceMixer::new(config.channels, config.sample_rate.0);
        let device_name = device.name().map_err(device_error)?;

        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(0);
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<()>>(1);
        let stream_mixer = mixer.clone();

        // The stream isn't Send on every platform, so it lives on its own thread.
        let output_thread = thread::spawn(move || {
            let stream = match sample_format {
                cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, stream_mixer),
                cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, stream_mixer),
                cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, stream_mixer),
                cpal::SampleFormat::I32 => build_stream::<i32>(&device, &config, stream_mixer),
                other => {
                    let _ = ready_tx.send(Err(SoundError::AudioDevice(format!(
                        "unsupported sample format {:?}",
                        other
                    ))));
                    return;
                }
            };

            let stream = match stream.map_err(device_error) {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            if let Err(e) = stream.play() {
                let _ = ready_tx.send(Err(device_error(e)));
                return;
            }
            let _ = ready_tx.send(Ok(()));

            // Keep the stream alive until the device goes away.
            let _ = shutdown_rx.recv();
        });

        ready_rx
            .recv()
            .map_err(|_| SoundError::AudioDevice("output thread exited".into()))??;

        info!(
            device = device_name,
            sample_rate = mixer.sample_rate(),
            channels = mixer.num_channels(),
            "CPAL output stream started"
        );

        Ok(Device {
            name: device_name,
            host_id,
            mixer,
            shutdown: Some(shutdown_tx),
            output_thread: Some(output_thread),
        })
    }
}

impl super::Device for Device {
    fn name(&self) -> &str {
        &self.name
    }

    fn output_rate(&self) -> u32 {
        self.mixer.sample_rate()
    }

    fn create_voice(&self) -> Result<Arc<dyn Voice>> {
        let voice = Arc::new(SoftwareVoice::new());
        self.mixer.add_voice(voice.clone());
        Ok(voice)
    }

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<super::mock::Device>> {
        Err(SoundError::UnsupportedType("to_mock"))
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        self.shutdown.take();
        if let Some(thread) = self.output_thread.take() {
            let _ = thread.join();
        }
    }
}
