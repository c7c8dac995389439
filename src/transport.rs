//! Byte stream transports the printer can be reached over.
//!
//! The protocol only needs a reliable ordered byte stream. Deadlines are the
//! transport's business: a timed out read or write surfaces as an ordinary
//! error.

use std::{
    fs::{File, OpenOptions},
    io::{Read, Write},
    net::{TcpStream, ToSocketAddrs},
    path::Path,
    time::Duration,
};

use log::debug;

use crate::error::Error;

/// Bidirectional byte stream to the printer.
pub trait Transport {
    /// Write the whole buffer.
    fn send(&mut self, buf: &[u8]) -> Result<(), Error>;

    /// Block until exactly `n` bytes have been read.
    fn recv(&mut self, n: usize) -> Result<Vec<u8>, Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, buf: &[u8]) -> Result<(), Error> {
        (**self).send(buf)
    }

    fn recv(&mut self, n: usize) -> Result<Vec<u8>, Error> {
        (**self).recv(n)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, buf: &[u8]) -> Result<(), Error> {
        (**self).send(buf)
    }

    fn recv(&mut self, n: usize) -> Result<Vec<u8>, Error> {
        (**self).recv(n)
    }
}

/// Any `Read + Write` stream: an RFCOMM tty, a TCP socket, a serial port.
#[derive(Debug)]
pub struct StreamTransport<S> {
    stream: S,
}

impl<S: Read + Write> StreamTransport<S> {
    pub fn new(stream: S) -> Self {
        StreamTransport { stream }
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl StreamTransport<File> {
    /// Open a character device such as `/dev/rfcomm0`.
    pub fn open_device<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        debug!("opening {}", path.as_ref().display());
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self::new(file))
    }
}

impl StreamTransport<TcpStream> {
    /// Connect over TCP with the same deadline on connect, reads and writes.
    pub fn connect_tcp<A: ToSocketAddrs>(addr: A, timeout: Duration) -> Result<Self, Error> {
        let mut last_err = None;
        for addr in addr.to_socket_addrs()? {
            debug!("connecting to {}", addr);
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(timeout))?;
                    stream.set_write_timeout(Some(timeout))?;
                    stream.set_nodelay(true)?;
                    return Ok(Self::new(stream));
                }
                Err(err) => last_err = Some(err),
            }
        }
        Err(last_err.map(Error::Io).unwrap_or(Error::DeviceOffline))
    }
}

impl<S: Read + Write> Transport for StreamTransport<S> {
    fn send(&mut self, buf: &[u8]) -> Result<(), Error> {
        self.stream.write_all(buf)?;
        self.stream.flush()?;
        Ok(())
    }

    fn recv(&mut self, n: usize) -> Result<Vec<u8>, Error> {
        let mut buf = vec![0u8; n];
        self.stream.read_exact(&mut buf)?;
        Ok(buf)
    }
}

#[cfg(feature = "usb")]
pub use self::usb::UsbTransport;

#[cfg(feature = "usb")]
mod usb {
    use log::{debug, info};
    use rusb::{Context, Device, DeviceDescriptor, DeviceHandle, Direction, TransferType, UsbContext};
    use std::time::Duration;

    use super::Transport;
    use crate::error::Error;

    /// Brother Industries
    pub const VENDOR_ID: u16 = 0x04F9;

    #[derive(Debug, Clone, Copy)]
    struct Endpoint {
        config: u8,
        iface: u8,
        setting: u8,
        address: u8,
    }

    /// Bulk endpoints of a USB attached printer.
    pub struct UsbTransport {
        handle: DeviceHandle<Context>,
        endpoint_out: Endpoint,
        endpoint_in: Endpoint,
        timeout: Duration,
    }

    impl UsbTransport {
        /// Open the first printer with `product_id`, or the one whose serial
        /// number matches when `serial` is given.
        pub fn open(product_id: u16, serial: Option<&str>) -> Result<Self, Error> {
            let mut context = Context::new()?;
            let (device, device_desc, mut handle) =
                Self::open_device(&mut context, VENDOR_ID, product_id, serial)?;

            let endpoint_in =
                Self::find_endpoint(&device, &device_desc, Direction::In, TransferType::Bulk)
                    .ok_or(Error::MissingEndpoint)?;
            let endpoint_out =
                Self::find_endpoint(&device, &device_desc, Direction::Out, TransferType::Bulk)
                    .ok_or(Error::MissingEndpoint)?;

            handle.set_auto_detach_kernel_driver(true).ok();
            let has_kernel_driver = matches!(handle.kernel_driver_active(endpoint_out.iface), Ok(true));
            info!("Kernel driver support is {}", has_kernel_driver);

            handle.set_active_configuration(endpoint_out.config)?;
            handle.claim_interface(endpoint_out.iface)?;
            handle.set_alternate_setting(endpoint_out.iface, endpoint_out.setting)?;

            Ok(UsbTransport {
                handle,
                endpoint_out,
                endpoint_in,
                timeout: Duration::from_secs(10),
            })
        }

        pub fn timeout(mut self, timeout: Duration) -> Self {
            self.timeout = timeout;
            self
        }

        fn open_device(
            context: &mut Context,
            vid: u16,
            pid: u16,
            serial: Option<&str>,
        ) -> Result<(Device<Context>, DeviceDescriptor, DeviceHandle<Context>), Error> {
            let devices = context.devices()?;

            for device in devices.iter() {
                let device_desc = match device.device_descriptor() {
                    Ok(d) => d,
                    Err(err) => {
                        debug!("{:?}", err);
                        continue;
                    }
                };

                if device_desc.vendor_id() != vid || device_desc.product_id() != pid {
                    continue;
                }

                let handle = match device.open() {
                    Ok(handle) => handle,
                    Err(err) => {
                        debug!("Failed to open device: {:?}", err);
                        continue;
                    }
                };

                let wanted = match serial {
                    Some(wanted) => wanted,
                    None => return Ok((device, device_desc, handle)),
                };

                let timeout = Duration::from_secs(1);
                let language = match handle.read_languages(timeout)?.first() {
                    Some(language) => *language,
                    None => continue,
                };
                match handle.read_serial_number_string(language, &device_desc, timeout) {
                    Ok(s) if s == wanted => return Ok((device, device_desc, handle)),
                    Ok(_) => continue,
                    Err(err) => {
                        debug!("Failed to read serial number string: {:?}", err);
                        continue;
                    }
                }
            }
            debug!("No device {:04x}:{:04x} matches serial {:?}", vid, pid, serial);
            Err(Error::DeviceOffline)
        }

        fn find_endpoint(
            device: &Device<Context>,
            device_desc: &DeviceDescriptor,
            direction: Direction,
            transfer_type: TransferType,
        ) -> Option<Endpoint> {
            for n in 0..device_desc.num_configurations() {
                let config_desc = match device.config_descriptor(n) {
                    Ok(c) => c,
                    Err(_) => continue,
                };
                for interface in config_desc.interfaces() {
                    for interface_desc in interface.descriptors() {
                        for endpoint_desc in interface_desc.endpoint_descriptors() {
                            if endpoint_desc.direction() == direction
                                && endpoint_desc.transfer_type() == transfer_type
                            {
                                return Some(Endpoint {
                                    config: config_desc.number(),
                                    iface: interface_desc.interface_number(),
                                    setting: interface_desc.setting_number(),
                                    address: endpoint_desc.address(),
                                });
                            }
                        }
                    }
                }
            }
            None
        }
    }

    impl Transport for UsbTransport {
        fn send(&mut self, buf: &[u8]) -> Result<(), Error> {
            let n = self
                .handle
                .write_bulk(self.endpoint_out.address, buf, self.timeout)?;
            if n != buf.len() {
                debug!(
                    "write error: bytes wrote {} != bytes supplied {}, possibly timeout ?",
                    n,
                    buf.len()
                );
                return Err(Error::ShortWrite {
                    written: n,
                    expected: buf.len(),
                });
            }
            Ok(())
        }

        fn recv(&mut self, n: usize) -> Result<Vec<u8>, Error> {
            let mut buf = vec![0u8; n];
            let mut filled = 0;
            // the printer answers with empty reads until the reply is ready
            let mut retries = 10;

            while filled < n {
                let read = self
                    .handle
                    .read_bulk(self.endpoint_in.address, &mut buf[filled..], self.timeout)?;
                if read == 0 {
                    retries -= 1;
                    if retries == 0 {
                        return Err(Error::Io(std::io::ErrorKind::TimedOut.into()));
                    }
                    std::thread::sleep(Duration::from_millis(100));
                }
                filled += read;
            }
            Ok(buf)
        }
    }

    impl Drop for UsbTransport {
        fn drop(&mut self) {
            self.handle.release_interface(self.endpoint_out.iface).ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[derive(Default)]
    struct Loopback {
        input: Cursor<Vec<u8>>,
        output: Vec<u8>,
    }

    impl Read for Loopback {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for Loopback {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.output.write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn stream_sends_and_receives() {
        let mut transport = StreamTransport::new(Loopback {
            input: Cursor::new(vec![1, 2, 3, 4]),
            output: Vec::new(),
        });
        transport.send(&[0x1B, 0x40]).unwrap();
        assert_eq!(transport.recv(3).unwrap(), vec![1, 2, 3]);
        assert_eq!(transport.into_inner().output, vec![0x1B, 0x40]);
    }

    #[test]
    fn short_read_is_an_io_error() {
        let mut transport = StreamTransport::new(Loopback {
            input: Cursor::new(vec![0; 31]),
            output: Vec::new(),
        });
        assert!(matches!(transport.recv(32), Err(Error::Io(_))));
    }
}
