use std::io;

use log::{debug, error};

use crate::error::Result;

/// Reports the name of every serial port registered with the OS, without
/// opening any of them.
///
/// The callback runs synchronously, once per port, in whatever order the
/// OS enumerates its device registry. A host without any serial registry is
/// success with zero invocations; any other native failure aborts the
/// enumeration with the mapped error.
pub fn enumerate<F>(mut callback: F) -> Result<()>
where
    F: FnMut(&str),
{
    let ports = match serialport::available_ports() {
        Ok(ports) => ports,
        // A host whose device registry does not exist simply has no ports.
        Err(err)
            if matches!(
                err.kind(),
                serialport::ErrorKind::NoDevice
                    | serialport::ErrorKind::Io(io::ErrorKind::NotFound)
            ) =>
        {
            return Ok(())
        }
        Err(err) => {
            error!("Failed to enumerate serial ports: {}", err);
            return Err(err.into());
        }
    };

    for info in ports {
        debug!("Found serial port {}", info.port_name);
        callback(&info.port_name);
    }

    Ok(())
}
