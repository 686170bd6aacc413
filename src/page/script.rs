//! Browser glue for the price form.
//!
//! Opens a form session, mirrors every keystroke to the server and renders
//! the returned snapshot. All formatting and validation happen server-side.
//!
//! Edits to one field are sent one at a time and carry a growing `seq`; only
//! the newest pending value is sent, and only the answer to the newest edit
//! is rendered. The field being typed into is never overwritten.

pub(super) const FORM_SCRIPT: &str = r#"
(() => {
  const api = '/api/v1';
  const button = document.getElementById('enviar');
  const estado = document.getElementById('estado');
  const inputs = document.querySelectorAll('input[data-code]');
  let session = null;
  let submitting = false;
  let seq = 0;
  let snapshot = null;
  const latest = new Map();
  const queues = new Map();

  const call = async (method, path, body) => {
    const res = await fetch(api + path, {
      method,
      headers: body ? { 'Content-Type': 'application/json' } : {},
      body: body ? JSON.stringify(body) : undefined,
    });
    const data = res.status === 204 ? null : await res.json();
    return { ok: res.ok, data };
  };

  const showStatus = (status) => {
    if (!status || status.kind === 'none') {
      estado.hidden = true;
      return;
    }
    estado.hidden = false;
    estado.className = status.kind;
    estado.textContent = status.message;
  };

  const displayFor = (code) => {
    const edit = snapshot && snapshot.edits.find((e) => e.code === code);
    return edit ? edit.display : '';
  };

  const render = (data) => {
    snapshot = data;
    inputs.forEach((input) => {
      if (input !== document.activeElement) input.value = displayFor(input.dataset.code);
    });
    submitting = snapshot.submitting;
    button.disabled = !snapshot.can_submit;
    button.textContent = submitting ? 'Enviando...' : 'Enviar Actualizaciones';
    showStatus(snapshot.status);
  };

  const refresh = async () => {
    const { ok, data } = await call('GET', `/sessions/${session}`);
    if (ok) render(data);
  };

  inputs.forEach((input) => {
    const code = input.dataset.code;
    const path = () => `/sessions/${session}/edits/${encodeURIComponent(code)}`;

    input.addEventListener('input', () => {
      if (!session) return;
      const mine = ++seq;
      const raw = input.value;
      latest.set(code, mine);
      const previous = queues.get(code) || Promise.resolve();
      const next = previous
        .then(async () => {
          if (latest.get(code) !== mine) return;
          const { ok, data } = await call('PUT', path(), { raw, seq: mine });
          if (ok && latest.get(code) === mine) render(data);
        })
        .catch(() => {});
      queues.set(code, next);
    });

    input.addEventListener('blur', async () => {
      await queues.get(code);
      if (input !== document.activeElement) input.value = displayFor(code);
    });
  });

  button.addEventListener('click', async () => {
    if (!session || submitting) return;
    submitting = true;
    button.disabled = true;
    button.textContent = 'Enviando...';
    await Promise.all(queues.values());
    const { ok, data } = await call('POST', `/sessions/${session}/submit`);
    await refresh();
    if (ok) {
      setTimeout(refresh, STATUS_RESET_MS + 100);
    } else if (data && data.error && estado.hidden) {
      showStatus({ kind: 'error', message: data.error.message });
    }
  });

  window.addEventListener('pagehide', () => {
    if (session) fetch(`${api}/sessions/${session}`, { method: 'DELETE', keepalive: true });
  });

  call('POST', '/sessions').then(({ ok, data }) => {
    if (!ok) {
      showStatus({ kind: 'error', message: 'No se pudo iniciar el formulario.' });
      return;
    }
    session = data.session_id;
    render(data);
  });
})();
"#;
