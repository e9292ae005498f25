//! Bootstrap script generation.
//!
//! The generated source is evaluated once inside the freshly spawned main
//! process. It dials the session's control endpoint, answers the handshake
//! and helper RPCs, and loads the requested page.

use serde_json::json;

use crate::config::BrowserConfig;
use crate::control::endpoint_for;
use crate::error::Result;

/// Produces the bootstrap source for one session.
pub trait BootstrapScript: Send + Sync {
	fn generate(&self, config: &BrowserConfig, page_url: &str) -> Result<String>;
}

/// Default generator targeting an Electron main process.
pub struct HookScript;

impl BootstrapScript for HookScript {
	fn generate(&self, config: &BrowserConfig, page_url: &str) -> Result<String> {
		let endpoint = json!(endpoint_for(&config.browser_id).to_string());
		let expected_url = json!(config.expected_main_url(page_url));
		let page_url = json!(page_url);

		Ok(format!(
			r#"(function () {{
    const net = require('net');
    const {{ app, BrowserWindow, Menu, dialog }} = require('electron');

    const expectedUrl = {expected_url};
    const openedUrls = [];
    let completed = false;
    let dialogHandler = null;

    app.on('browser-window-created', (event, window) => {{
        window.webContents.on('did-navigate', (navEvent, url) => {{
            openedUrls.push(url);
            if (url === expectedUrl)
                completed = true;
        }});
    }});

    const endpoint = {endpoint};
    const socket = endpoint.includes(':') && !endpoint.startsWith('/')
        ? net.createConnection({{ host: endpoint.split(':')[0], port: Number(endpoint.split(':')[1]) }})
        : net.createConnection(endpoint);

    const menuItems = menu => (menu ? menu.items : []).map(item => ({{
        label: item.label,
        enabled: item.enabled,
        checked: item.type === 'checkbox' || item.type === 'radio' ? item.checked : undefined,
        items: item.submenu ? menuItems(item.submenu) : []
    }}));

    const findItem = (menu, path) => {{
        let items = menu ? menu.items : [];
        let found = null;
        for (const label of path) {{
            found = items.find(item => item.label === label);
            if (!found)
                throw new Error('menu item not found: ' + path.join(' > '));
            items = found.submenu ? found.submenu.items : [];
        }}
        return found;
    }};

    const handlers = {{
        getInjectingStatus: () => ({{ completed, openedUrls: completed ? [] : openedUrls }}),
        terminateProcess: () => {{ setImmediate(() => app.exit(0)); return null; }},
        getMainMenuItems: () => menuItems(Menu.getApplicationMenu()),
        getContextMenuItems: () => menuItems(global.__lastContextMenu || null),
        getMainMenuItem: params => {{
            const item = findItem(Menu.getApplicationMenu(), params.path);
            return {{ label: item.label, enabled: item.enabled, items: [] }};
        }},
        getContextMenuItem: params => {{
            const item = findItem(global.__lastContextMenu || null, params.path);
            return {{ label: item.label, enabled: item.enabled, items: [] }};
        }},
        clickOnMainMenuItem: params => {{ findItem(Menu.getApplicationMenu(), params.path).click(); return null; }},
        clickOnContextMenuItem: params => {{ findItem(global.__lastContextMenu || null, params.path).click(); return null; }},
        setElectronDialogHandler: params => {{
            dialogHandler = new Function('return ' + params.handler)();
            for (const fn of ['showOpenDialog', 'showSaveDialog', 'showMessageBox', 'showErrorBox'])
                dialog[fn] = (...args) => dialogHandler(fn, args, params.context);
            return null;
        }}
    }};

    let buffered = '';
    socket.on('data', chunk => {{
        buffered += chunk.toString();
        let newline;
        while ((newline = buffered.indexOf('\n')) !== -1) {{
            const request = JSON.parse(buffered.slice(0, newline));
            buffered = buffered.slice(newline + 1);
            let response;
            try {{
                response = {{ id: request.id, result: handlers[request.method](request.params) }};
            }}
            catch (error) {{
                response = {{ id: request.id, error: String(error.message || error) }};
            }}
            socket.write(JSON.stringify(response) + '\n');
        }}
    }});

    app.whenReady().then(() => {{
        const window = new BrowserWindow({{ show: true }});
        window.loadURL({page_url});
    }});
}})();"#
		))
	}
}
