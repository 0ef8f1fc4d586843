//! Point-in-time copies of the two OS tables the resolver joins: the process
//! list and the established TCP connection list. Collected fresh on every
//! discovery call; nothing is cached.

use anyhow::{Context, Result};
use netstat2::{AddressFamilyFlags, ProtocolFlags, ProtocolSocketInfo, TcpState};
use sysinfo::System;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRow {
    pub pid: u32,
    pub name: String,
    /// Title of the process's main visible window; empty when it has none.
    pub window_title: String,
}

/// An established TCP connection owned by `pid`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpRow {
    pub pid: u32,
    pub local_addr: String,
    pub remote_addr: String,
    pub remote_port: u16,
}

pub fn process_table() -> Vec<ProcessRow> {
    let mut system = System::new_all();
    system.refresh_processes();

    let titles = window_titles::by_pid();

    system
        .processes()
        .iter()
        .map(|(pid, process)| {
            let pid = pid.as_u32();
            ProcessRow {
                pid,
                name: process.name().to_string(),
                window_title: titles.get(&pid).cloned().unwrap_or_default(),
            }
        })
        .collect()
}

/// Established TCP rows owned by any of `pids`.
pub fn tcp_table(pids: &[u32]) -> Result<Vec<TcpRow>> {
    let families = AddressFamilyFlags::IPV4 | AddressFamilyFlags::IPV6;
    let sockets = netstat2::get_sockets_info(families, ProtocolFlags::TCP)
        .context("failed to read the TCP connection table")?;

    let mut rows = Vec::new();
    for socket in sockets {
        let ProtocolSocketInfo::Tcp(tcp) = &socket.protocol_socket_info else {
            continue;
        };
        if tcp.state != TcpState::Established {
            continue;
        }
        for pid in &socket.associated_pids {
            if pids.contains(pid) {
                rows.push(TcpRow {
                    pid: *pid,
                    local_addr: tcp.local_addr.to_string(),
                    remote_addr: tcp.remote_addr.to_string(),
                    remote_port: tcp.remote_port,
                });
            }
        }
    }
    Ok(rows)
}

#[cfg(windows)]
mod window_titles {
    use std::collections::HashMap;

    use winapi::shared::minwindef::{BOOL, LPARAM, TRUE};
    use winapi::shared::windef::HWND;
    use winapi::um::winuser::{
        EnumWindows, GetWindowTextLengthW, GetWindowTextW, GetWindowThreadProcessId,
        IsWindowVisible,
    };

    /// Maps each pid to the title of its first visible, titled top-level
    /// window.
    pub fn by_pid() -> HashMap<u32, String> {
        unsafe extern "system" fn collect(hwnd: HWND, lparam: LPARAM) -> BOOL {
            let map = &mut *(lparam as *mut HashMap<u32, String>);

            if IsWindowVisible(hwnd) == 0 {
                return TRUE;
            }
            let length = GetWindowTextLengthW(hwnd);
            if length <= 0 {
                return TRUE;
            }
            let mut buffer = vec![0u16; length as usize + 1];
            let copied = GetWindowTextW(hwnd, buffer.as_mut_ptr(), buffer.len() as i32);
            if copied <= 0 {
                return TRUE;
            }
            let mut pid = 0u32;
            GetWindowThreadProcessId(hwnd, &mut pid);
            if pid != 0 {
                map.entry(pid)
                    .or_insert_with(|| String::from_utf16_lossy(&buffer[..copied as usize]));
            }
            TRUE
        }

        let mut map: HashMap<u32, String> = HashMap::new();
        unsafe {
            EnumWindows(Some(collect), &mut map as *mut _ as LPARAM);
        }
        map
    }
}

#[cfg(not(windows))]
mod window_titles {
    use std::collections::HashMap;

    /// Power BI Desktop only runs on Windows; elsewhere no process has an
    /// addressable window, so discovery naturally yields no sessions.
    pub fn by_pid() -> HashMap<u32, String> {
        HashMap::new()
    }
}
